//! The `boltbench` binary.

fn main() -> anyhow::Result<()> {
    boltbench_server::cli::execute()
}
