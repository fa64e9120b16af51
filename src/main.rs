use anyhow::Context;
use log::info;
use sfr_panel::{CpiSeries, CpiSource, PipelineConfig, VariantConfig, run_variants};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = PipelineConfig::from_env().context("reading configuration")?;
    info!("{config}");

    let mut variants = VariantConfig::standard_variants();

    // Deflate to dollars of the last panel year whenever a CPI source is configured.
    let cpi = if config.cpi_source == CpiSource::None {
        None
    } else {
        let first = variants.iter().map(|v| *v.years.start()).min().unwrap_or(1967);
        let last = variants.iter().map(|v| *v.years.end()).max().unwrap_or(2010);
        for variant in &mut variants {
            variant.deflate_to = Some(*variant.years.end());
        }
        CpiSeries::load(&config, first..=last)
            .await
            .context("loading CPI series")?
    };

    let outputs = run_variants(&config, &variants, cpi.as_ref()).context("building panels")?;
    for output in &outputs {
        info!(
            "{}: {} districts, {} county-years -> {}",
            output.variant,
            output.district_flags.len(),
            output.county_panel.len(),
            output.output_dir.display()
        );
    }
    Ok(())
}
