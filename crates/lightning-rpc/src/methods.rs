use std::ops::Deref;

use lightning_rpc_client::{Client, Result};
use serde_json::Value;

/// [`Client`] with one async method per daemon command.
///
/// Each wrapper forwards its positional parameters unchanged, so
/// `ln.listpeers(vec![json!(id)])` is `client.call("listpeers", [id])`.
/// Dashes in command names become underscores (`dev-rhash` is `dev_rhash`).
/// Everything else on [`Client`] is reachable through `Deref`.
#[derive(Debug)]
pub struct LightningClient {
    client: Client,
}

impl LightningClient {
    /// Connect to the socket at `location` with the default configuration.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[cfg(unix)]
    pub fn open(
        location: impl AsRef<std::path::Path>,
    ) -> std::result::Result<Self, lightning_rpc_client::TransportError> {
        Ok(Self::from(Client::connect(location)?))
    }

    /// Connect to the socket at `location`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[cfg(unix)]
    pub fn new(
        location: impl AsRef<std::path::Path>,
        config: lightning_rpc_client::ClientConfig,
    ) -> std::result::Result<Self, lightning_rpc_client::TransportError> {
        Ok(Self::from(Client::new(location, config)?))
    }

    pub fn into_inner(self) -> Client {
        self.client
    }
}

impl From<Client> for LightningClient {
    fn from(client: Client) -> Self {
        Self { client }
    }
}

impl Deref for LightningClient {
    type Target = Client;

    fn deref(&self) -> &Client {
        &self.client
    }
}

macro_rules! daemon_commands {
    ($($name:literal => $func:ident),* $(,)?) => {
        /// Commands the daemon is known to accept.
        pub const METHODS: &[&str] = &[$($name),*];

        impl LightningClient {
            $(
                #[doc = concat!("Invoke the daemon's `", $name, "` command.")]
                pub async fn $func(&self, params: Vec<Value>) -> Result<Value> {
                    self.client.call_positional($name, params).await
                }
            )*
        }
    };
}

daemon_commands! {
    "autocleaninvoice" => autocleaninvoice,
    "check" => check,
    "checkmessage" => checkmessage,
    "close" => close,
    "connect" => connect,
    "decodepay" => decodepay,
    "delexpiredinvoice" => delexpiredinvoice,
    "delinvoice" => delinvoice,
    "dev-crash" => dev_crash,
    "dev-listaddrs" => dev_listaddrs,
    "dev-memdump" => dev_memdump,
    "dev-memleak" => dev_memleak,
    "dev-query-scids" => dev_query_scids,
    "dev-rescan-outputs" => dev_rescan_outputs,
    "dev-rhash" => dev_rhash,
    "disconnect" => disconnect,
    "feerates" => feerates,
    "fundchannel" => fundchannel,
    "getinfo" => getinfo,
    "getlog" => getlog,
    "getroute" => getroute,
    "help" => help,
    "invoice" => invoice,
    "listchannels" => listchannels,
    "listconfigs" => listconfigs,
    "listforwards" => listforwards,
    "listfunds" => listfunds,
    "listinvoices" => listinvoices,
    "listnodes" => listnodes,
    "listpayments" => listpayments,
    "listpeers" => listpeers,
    "listsendpays" => listsendpays,
    "listtransactions" => listtransactions,
    "newaddr" => newaddr,
    "pay" => pay,
    "ping" => ping,
    "sendpay" => sendpay,
    "setchannelfee" => setchannelfee,
    "signmessage" => signmessage,
    "stop" => stop,
    "txdiscard" => txdiscard,
    "txprepare" => txprepare,
    "txsend" => txsend,
    "waitanyinvoice" => waitanyinvoice,
    "waitinvoice" => waitinvoice,
    "waitsendpay" => waitsendpay,
    "withdraw" => withdraw,
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn method_names_are_unique_and_lowercase() {
        let unique: HashSet<_> = METHODS.iter().collect();
        assert_eq!(unique.len(), METHODS.len());
        for name in METHODS {
            assert!(
                name.chars().all(|c| c.is_ascii_lowercase() || c == '-'),
                "{name}"
            );
        }
        assert!(METHODS.contains(&"getinfo"));
        assert!(METHODS.contains(&"dev-rhash"));
    }
}
