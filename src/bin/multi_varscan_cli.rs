use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::Parser;

use multi_varscan::config::JobConfig;
use multi_varscan::progress::RunProgress;
use multi_varscan::{run_with_progress, SubprocessRunner};

/// Multithreaded VarScan2 somatic calling over tumor/normal mpileups.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The mpileup file for a tumor/normal pair (repeat for more pairs)
    #[arg(long = "pileup", required = true)]
    pileups: Vec<PathBuf>,

    /// Number of pileups processed at once
    #[arg(long, default_value_t = 2, env = "MULTI_VARSCAN_THREADS")]
    thread_count: usize,

    /// JVM -Xmx argument
    #[arg(long, default_value = "3G")]
    java_opts: String,

    /// Java executable
    #[arg(long, default_value = "java")]
    java_bin: String,

    /// VarScan jar
    #[arg(long, default_value = "/opt/VarScan.v2.3.9.jar", env = "VARSCAN_JAR")]
    varscan_jar: String,

    /// Minimum coverage in normal and tumor to call variant
    #[arg(long, default_value_t = 8)]
    min_coverage: u32,

    /// Minimum coverage in normal to call somatic
    #[arg(long, default_value_t = 8)]
    min_coverage_normal: u32,

    /// Minimum coverage in tumor to call somatic
    #[arg(long, default_value_t = 6)]
    min_coverage_tumor: u32,

    /// Minimum variant frequency to call a heterozygote
    #[arg(long, default_value_t = 0.10)]
    min_var_freq: f64,

    /// Minimum frequency to call homozygote
    #[arg(long, default_value_t = 0.75)]
    min_freq_for_hom: f64,

    /// Estimated purity (non-tumor content) of normal sample
    #[arg(long, default_value_t = 1.00)]
    normal_purity: f64,

    /// Estimated purity (tumor content) of tumor sample
    #[arg(long, default_value_t = 1.00)]
    tumor_purity: f64,

    /// P-value threshold to call a heterozygote
    #[arg(long, default_value_t = 0.99)]
    vs_p_value: f64,

    /// P-value threshold to call a somatic site
    #[arg(long, default_value_t = 0.05)]
    somatic_p_value: f64,

    /// If set to 1, removes variants with >0.9 strand bias
    #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=1))]
    strand_filter: u8,

    /// Output all compared positions even if non-variant
    #[arg(long)]
    validation: bool,

    /// If set to 1, output VCF instead of VarScan native format
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u8).range(0..=1))]
    output_vcf: u8,

    /// Minimum variant allele frequency in tumor
    #[arg(long, default_value_t = 0.10)]
    min_tumor_freq: f64,

    /// Maximum variant allele frequency in normal
    #[arg(long, default_value_t = 0.05)]
    max_normal_freq: f64,

    /// P-value for high-confidence calling
    #[arg(long, default_value_t = 0.07)]
    vps_p_value: f64,

    /// Kill any single VarScan call running longer than this many seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory VarScan runs in and writes its per-pileup files to
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Directory for the merged snp/indel VCFs
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

impl Args {
    fn into_job(self) -> (Vec<PathBuf>, JobConfig) {
        let config = JobConfig {
            min_coverage: self.min_coverage,
            min_coverage_normal: self.min_coverage_normal,
            min_coverage_tumor: self.min_coverage_tumor,
            min_var_freq: self.min_var_freq,
            min_freq_for_hom: self.min_freq_for_hom,
            normal_purity: self.normal_purity,
            tumor_purity: self.tumor_purity,
            vs_p_value: self.vs_p_value,
            somatic_p_value: self.somatic_p_value,
            strand_filter: self.strand_filter == 1,
            output_vcf: self.output_vcf == 1,
            validation: self.validation,
            min_tumor_freq: self.min_tumor_freq,
            max_normal_freq: self.max_normal_freq,
            vps_p_value: self.vps_p_value,
            java_bin: self.java_bin,
            java_opts: self.java_opts,
            varscan_jar: self.varscan_jar,
            timeout: self.timeout.map(Duration::from_secs),
            thread_count: self.thread_count,
            work_dir: self.work_dir,
            output_dir: self.output_dir,
        };
        (self.pileups, config)
    }
}

fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] [{}] [{}] - {}",
                record.level(),
                buf.timestamp_seconds(),
                record.target(),
                record.args()
            )
        })
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let start = Instant::now();

    log::info!("{}", "-".repeat(80));
    log::info!("multi-varscan {}", env!("CARGO_PKG_VERSION"));
    log::info!("Program Args: {}", std::env::args().collect::<Vec<_>>().join(" "));
    log::info!("{}", "-".repeat(80));

    let (pileups, config) = Args::parse().into_job();
    log::info!(
        "Processing tumor-normal mpileups: {}",
        pileups
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>()
            .join(", ")
    );

    let progress = RunProgress::stderr();
    let result = run_with_progress(&pileups, config, &SubprocessRunner::new(), &progress);

    match result {
        Ok(summary) => {
            progress.tasks().finish_with_message("all pileups processed");
            if !summary.empty_outputs.is_empty() {
                log::error!("{} empty high-confidence output(s) were merged", summary.empty_outputs.len());
            }
            log::info!("Merged SNPs: {}", summary.snp_merged.display());
            log::info!("Merged INDELs: {}", summary.indel_merged.display());
            log::info!("Finished, took {:.2} seconds", start.elapsed().as_secs_f64());
            ExitCode::SUCCESS
        }
        Err(err) => {
            progress.tasks().abandon_with_message("run failed");
            log::error!("{err}");
            ExitCode::FAILURE
        }
    }
}
