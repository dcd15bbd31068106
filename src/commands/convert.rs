use anyhow::Result;

use crate::cli::{Cli, ConvertArgs};
use crate::{convert::{self, ConvertOptions}, crs::Crs};

pub fn run(_cli: &Cli, args: &ConvertArgs) -> Result<()> {
    let crs: Crs = args.crs.parse()?;
    let options = ConvertOptions { skip_invalid: args.skip_invalid };

    let written = convert::convert(&args.source, &args.destination, crs, &options)?;
    for path in &written {
        println!("Converted -> {} ({crs})", path.display());
    }
    Ok(())
}
