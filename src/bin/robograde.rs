use anyhow::Result;

fn main() -> Result<()> {
    robograde::cli::run()
}
