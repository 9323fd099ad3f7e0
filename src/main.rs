fn main() -> anyhow::Result<()> {
    vcf_missing::cli::run()
}
