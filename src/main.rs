use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;
use wg_split::config::Config;
use wg_split::policy::{PolicyBuilder, PolicyInput};
use wg_split::{netlist, wgconf};

#[derive(Parser)]
#[command(name = "wg-split")]
#[command(about = "Split-tunnel AllowedIPs generator for WireGuard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to the config file
    #[arg(short, long, global = true, default_value = "wg-split.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute AllowedIPs and patch the WireGuard config templates
    Generate {
        /// Local bypass-list file (fetched from the configured URL if absent)
        #[arg(short, long)]
        list: Option<PathBuf>,

        /// Directory holding the templates and receiving the patched configs
        #[arg(short, long, default_value = "vpn-output")]
        output_dir: PathBuf,

        /// Print the computed AllowedIPs to stdout, do not write files
        #[arg(long)]
        print_only: bool,
    },
    /// Generate a default config file
    Init,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logging goes to stderr so --print-only output stays clean on stdout
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Generate {
            list,
            output_dir,
            print_only,
        } => {
            let config = Config::load_or_default(&cli.config)?;
            let bypass = netlist::load(list.as_deref(), &config.list.url).await?;

            let mut exclusions = netlist::reserved_ranges();
            exclusions.extend(&bypass.blocks);

            let builder = PolicyBuilder::new(config.policy.floor_prefix, config.policy.block_cap);
            let output = builder.compute(&PolicyInput {
                exclusions,
                mandatory: config.policy.mandatory.clone(),
                route_budget: config.policy.route_budget,
            })?;

            info!("Final AllowedIPs: {} CIDR blocks", output.blocks.len());
            if !output.budget_met {
                warn!(
                    "Route budget of {} not reached; output has {} blocks",
                    config.policy.route_budget,
                    output.blocks.len()
                );
            }
            for repaired in &output.repaired {
                info!("Re-inserted mandatory subnet {}", repaired);
            }

            let rendered = wgconf::render_allowed_ips(&output.blocks);
            if print_only {
                println!("{}", rendered);
                return Ok(());
            }

            std::fs::create_dir_all(&output_dir)?;
            for pair in &config.templates {
                let source = output_dir.join(&pair.source);
                let dest = output_dir.join(&pair.output);
                if source.exists() {
                    wgconf::patch_file(&source, &dest, &rendered, &pair.label)?;
                } else {
                    warn!("Template not found, skipping: {}", source.display());
                }
            }
            info!("Done. Split-tunnel configs written to {}", output_dir.display());
        }
        Commands::Init => {
            info!("Generating default config...");
            let config = Config::default();
            config.save(&cli.config)?;
            println!("Created default config: {}", cli.config.display());
        }
    }

    Ok(())
}
