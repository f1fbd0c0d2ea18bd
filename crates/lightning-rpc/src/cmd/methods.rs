use lightning_rpc::METHODS;

use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_methods, OutputFormat};

pub fn run(format: OutputFormat) -> CliResult<i32> {
    print_methods(METHODS, format);
    Ok(SUCCESS)
}
