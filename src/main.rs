fn main() -> anyhow::Result<()> {
    classpulse_lib::run()
}
