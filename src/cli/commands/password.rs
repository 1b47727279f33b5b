use serde_json::json;

use crate::cli::OutputFormat;
use crate::provisioning::generate_password;

pub fn handle(count: usize, output_format: OutputFormat) -> anyhow::Result<()> {
    let passwords: Vec<String> = (0..count.max(1)).map(|_| generate_password()).collect();

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "passwords": passwords }))?);
        }
        OutputFormat::Text => {
            for password in passwords {
                println!("{}", password);
            }
        }
    }
    Ok(())
}
