//! blind-measure - CLI for window-blind measurement records.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use blind_measure::config::{DEFAULT_API_URL, ENV_API_URL, ENV_TABLE_ID, ENV_TOKEN};
use blind_measure::report::{customer_summary, measurement_table, write_customer_report};
use blind_measure::{
    derive_geometry_with, parse_sample, validate_measurement, AveragingPolicy, BaserowStore,
    BlindType, CeilingType, ControlType, GroupingPolicy, IndexConfig, MeasureError,
    MeasurementData, MeasurementDraft, MeasurementFilter, MeasurementIndex, MeasurementPatch,
    MountType, StoreConfig,
};

/// Record and review window-blind measurements stored in Baserow.
#[derive(Parser, Debug)]
#[command(name = "blind-measure")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Baserow API host
    #[arg(long, env = ENV_API_URL, default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Baserow database token
    #[arg(long, env = ENV_TOKEN, hide_env_values = true)]
    token: Option<String>,

    /// Table holding the measurement rows
    #[arg(long, env = ENV_TABLE_ID)]
    table_id: Option<u64>,

    /// How missing samples enter the average (zero-fill, present-only)
    #[arg(long, default_value = "zero-fill", value_parser = parse_averaging)]
    averaging: AveragingPolicy,

    /// Group customers ignoring case and surrounding spaces
    #[arg(long)]
    normalize_names: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List measurements
    List {
        #[arg(long)]
        customer: Option<String>,
        /// Window description contains this text
        #[arg(long)]
        window: Option<String>,
        #[arg(long)]
        blind_type: Option<BlindType>,
        #[arg(long)]
        mount: Option<MountType>,
        #[arg(long)]
        control: Option<ControlType>,
        /// First date included (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,
        /// Last date included (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// List customers with measurement counts
    Customers,

    /// Show one customer's measurements by window
    Show { customer: String },

    /// Add a measurement
    Add(AddArgs),

    /// Update fields of a measurement
    Edit {
        id: u64,
        #[command(flatten)]
        fields: EditArgs,
    },

    /// Delete a measurement
    Remove { id: u64 },

    /// Compute size and area from samples without storing anything
    Derive {
        /// Width samples, comma separated (left,center,right)
        #[arg(long, value_delimiter = ',')]
        widths: Vec<String>,
        /// Height samples, comma separated (top,middle,bottom)
        #[arg(long, value_delimiter = ',')]
        heights: Vec<String>,
    },

    /// Write all customers and their measurements as JSON
    Report { output: PathBuf },
}

#[derive(ClapArgs, Debug)]
struct AddArgs {
    #[arg(long)]
    customer: String,
    /// Window location or name
    #[arg(long)]
    window: String,
    #[arg(long)]
    contact: Option<String>,
    #[arg(long)]
    width_left: Option<String>,
    #[arg(long)]
    width_center: Option<String>,
    #[arg(long)]
    width_right: Option<String>,
    #[arg(long)]
    height_top: Option<String>,
    #[arg(long)]
    height_middle: Option<String>,
    #[arg(long)]
    height_bottom: Option<String>,
    #[arg(long)]
    fabric_code: Option<String>,
    #[arg(long)]
    blind_type: Option<BlindType>,
    #[arg(long)]
    control: Option<ControlType>,
    #[arg(long)]
    mount: Option<MountType>,
    #[arg(long)]
    ceiling: Option<CeilingType>,
    #[arg(long)]
    notes: Option<String>,
    /// Measurement date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

#[derive(ClapArgs, Debug)]
struct EditArgs {
    #[arg(long)]
    customer: Option<String>,
    #[arg(long)]
    window: Option<String>,
    #[arg(long)]
    contact: Option<String>,
    /// Sample value; pass an empty string to clear it
    #[arg(long)]
    width_left: Option<String>,
    #[arg(long)]
    width_center: Option<String>,
    #[arg(long)]
    width_right: Option<String>,
    #[arg(long)]
    height_top: Option<String>,
    #[arg(long)]
    height_middle: Option<String>,
    #[arg(long)]
    height_bottom: Option<String>,
    #[arg(long)]
    fabric_code: Option<String>,
    #[arg(long)]
    blind_type: Option<BlindType>,
    #[arg(long)]
    control: Option<ControlType>,
    #[arg(long)]
    mount: Option<MountType>,
    #[arg(long)]
    ceiling: Option<CeilingType>,
    #[arg(long)]
    notes: Option<String>,
    #[arg(long)]
    date: Option<NaiveDate>,
}

fn parse_averaging(s: &str) -> std::result::Result<AveragingPolicy, String> {
    AveragingPolicy::from_name(s).ok_or_else(|| format!("unknown averaging policy '{}'", s))
}

fn sample(text: &Option<String>) -> Option<f64> {
    text.as_deref().and_then(parse_sample)
}

/// Pad or truncate CLI samples to a triple.
fn triple(values: &[String]) -> [Option<f64>; 3] {
    let mut out = [None; 3];
    for (slot, text) in out.iter_mut().zip(values) {
        *slot = parse_sample(text);
    }
    out
}

impl AddArgs {
    fn into_data(self) -> MeasurementData {
        let mut data = MeasurementData::new(self.customer, self.window)
            .with_widths([
                sample(&self.width_left),
                sample(&self.width_center),
                sample(&self.width_right),
            ])
            .with_heights([
                sample(&self.height_top),
                sample(&self.height_middle),
                sample(&self.height_bottom),
            ]);
        if let Some(contact) = self.contact {
            data.contact = contact;
        }
        if let Some(code) = self.fabric_code {
            data.fabric_code = code;
        }
        if let Some(v) = self.blind_type {
            data.blind_type = v;
        }
        if let Some(v) = self.control {
            data.control = v;
        }
        if let Some(v) = self.mount {
            data.mount = v;
        }
        if let Some(v) = self.ceiling {
            data.ceiling_type = v;
        }
        if let Some(notes) = self.notes {
            data.notes = notes;
        }
        if self.date.is_some() {
            data.date = self.date;
        }
        data
    }
}

impl EditArgs {
    fn into_patch(self) -> MeasurementPatch {
        let edit_sample = |text: Option<String>| text.map(|t| parse_sample(&t));
        MeasurementPatch {
            customer_name: self.customer,
            contact: self.contact,
            window_description: self.window,
            width_left: edit_sample(self.width_left),
            width_center: edit_sample(self.width_center),
            width_right: edit_sample(self.width_right),
            height_top: edit_sample(self.height_top),
            height_middle: edit_sample(self.height_middle),
            height_bottom: edit_sample(self.height_bottom),
            fabric_code: self.fabric_code,
            blind_type: self.blind_type,
            control: self.control,
            mount: self.mount,
            ceiling_type: self.ceiling,
            notes: self.notes,
            date: self.date.map(Some),
            geometry: None,
        }
    }
}

fn store_config(args: &Args) -> Result<StoreConfig> {
    let token = args.token.clone().ok_or_else(|| MeasureError::MissingSetting {
        name: ENV_TOKEN.to_string(),
    })?;
    let table_id = args.table_id.ok_or_else(|| MeasureError::MissingSetting {
        name: ENV_TABLE_ID.to_string(),
    })?;
    Ok(StoreConfig::new(args.api_url.clone(), token, table_id))
}

/// Exit status for a failed run: the library error category, or 1.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|e| e.downcast_ref::<MeasureError>())
        .and_then(|e| u8::try_from(e.code_value()).ok())
        .unwrap_or(1)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::from(exit_code(&e))
        }
    }
}

async fn run(args: Args) -> Result<()> {
    if let Command::Derive { widths, heights } = &args.command {
        let g = derive_geometry_with(triple(widths), triple(heights), args.averaging);
        println!(
            "Width {:.2} cm, Height {:.2} cm, Area {:.2} m2 ({})",
            g.avg_width, g.avg_height, g.area_sq_meters, args.averaging
        );
        return Ok(());
    }

    let config = IndexConfig {
        averaging: args.averaging,
        grouping: if args.normalize_names {
            GroupingPolicy::Normalized
        } else {
            GroupingPolicy::Exact
        },
    };
    let store = BaserowStore::new(store_config(&args)?).context("Failed to create HTTP client")?;
    let mut index = MeasurementIndex::new(store, config);

    match args.command {
        Command::List {
            customer,
            window,
            blind_type,
            mount,
            control,
            from,
            to,
        } => {
            index.load().await?;
            let filter = MeasurementFilter {
                customer,
                window,
                blind_type,
                mount,
                control,
                start_date: from,
                end_date: to,
                ..Default::default()
            };
            let records = index.filter(&filter);
            print!("{}", measurement_table(records.iter().copied()));
            info!("{} measurement(s)", records.len());
        }

        Command::Customers => {
            index.load().await?;
            print!("{}", customer_summary(index.customers().values()));
        }

        Command::Show { customer } => {
            index.load().await?;
            let group = index
                .customer(&customer)
                .with_context(|| format!("No measurements for customer '{}'", customer))?;
            println!("{}", group.name);
            if !group.contact.is_empty() {
                println!("Contact: {}", group.contact);
            }
            for (window, records) in group.by_window() {
                println!("\n{}", window);
                print!("{}", measurement_table(records));
            }
            println!("\nTotal area: {:.2} m2", group.total_area());
        }

        Command::Add(add) => {
            let data = add.into_data();
            let validation = validate_measurement(&data, config.averaging);
            for warning in &validation.warnings {
                warn!("{}", warning);
            }
            for err in &validation.errors {
                error!("{}", err);
            }
            if !validation.passed {
                anyhow::bail!("Validation failed");
            }

            index.load().await?;
            let customer = data.customer_name.clone();
            let record = index
                .add_for_customer(&customer, MeasurementDraft::new(data))
                .await
                .context("Failed to add measurement")?;
            info!(
                "Added measurement {}: {:.2} x {:.2} cm, {:.2} m2",
                record.id,
                record.geometry.avg_width,
                record.geometry.avg_height,
                record.geometry.area_sq_meters
            );
        }

        Command::Edit { id, fields } => {
            index.load().await?;
            let record = index
                .edit(id, fields.into_patch())
                .await
                .with_context(|| format!("Failed to update measurement {}", id))?;
            info!(
                "Updated measurement {} ({}): {:.2} m2",
                record.id,
                record.customer_name(),
                record.geometry.area_sq_meters
            );
        }

        Command::Remove { id } => {
            index
                .remove(id)
                .await
                .with_context(|| format!("Failed to delete measurement {}", id))?;
            info!("Deleted measurement {}", id);
        }

        Command::Report { output } => {
            index.load().await?;
            write_customer_report(&output, index.customers().values())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!(
                "Wrote {} customer(s) to {}",
                index.customers().len(),
                output.display()
            );
        }

        // Handled before the store is created.
        Command::Derive { .. } => {}
    }

    Ok(())
}
