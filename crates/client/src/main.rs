use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use simple_signer_client::sign_file;

#[derive(Parser)]
struct Args {
    #[clap(long, env = "SIGNER_URL", default_value = "http://127.0.0.1:3000")]
    server: String,
    #[clap(long)]
    key: String,
    #[clap(long, env = "SIGNER_TOKEN")]
    token: String,
    file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let info = sign_file(&args.server, &args.key, &args.token, &args.file).await?;
    print!("{info}");
    Ok(())
}
