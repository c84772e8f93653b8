fn main() -> eyre::Result<()> {
    tagtree::App::new().run()
}
