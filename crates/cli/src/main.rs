use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use hmc_core::config::{bool_from_env_value, data_dir_from_env_value, id_strategy_from_env_value};
use hmc_core::constants::{
    COMMUNICATION_POLICIES, DEFAULT_DATA_DIR, DIAGNOSTIC_CODES, INTEGRATIONS, MEDICAL_SUPPLIES,
    MEDICATIONS, MESSAGE_TEMPLATES, OPERATING_HOURS, PERMISSIONS, PROCEDURE_CODES,
    REFERRAL_TEMPLATES, ROLES, SERVICE_PRICES, SHARED_CALENDARS, USER_ROLES,
};
use hmc_core::domain::{
    CommunicationPolicy, DiagnosticCode, Integration, MedicalSupply, Medication, MessageTemplate,
    OperatingHours, Permission, ProcedureCode, ReferralTemplate, Role, ServicePrice,
    SharedCalendar, UserRole,
};
use hmc_core::{
    parse_draft, ConsoleRegistry, CoreConfig, FieldSelector, Patch, Registered, RemovalDecision,
    SettingsDocument, SettingsKind,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "hmc")]
#[command(about = "Hospital management console")]
struct Cli {
    /// Directory for collection files (overrides HMC_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Persist to the default data directory when no other is configured
    #[arg(long, global = true)]
    persist: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List collection names with their sizes
    Collections,
    /// List every entity in a collection
    List { collection: String },
    /// Show one entity
    Show { collection: String, id: String },
    /// Filter a collection by a case-insensitive term
    Search {
        collection: String,
        term: String,
        /// Field to match (default: all searchable fields)
        #[arg(long, default_value = "all")]
        field: String,
    },
    /// Create an entity from a JSON draft
    Create { collection: String, draft: String },
    /// Merge a JSON patch into an entity
    Update {
        collection: String,
        id: String,
        patch: String,
    },
    /// Remove an entity
    Remove { collection: String, id: String },
    /// Report whether an entity may be removed
    CanRemove { collection: String, id: String },
    /// Role and assignment lookups
    #[command(subcommand)]
    Roles(RolesCommand),
    /// Hospital profile
    #[command(subcommand)]
    Profile(DocumentCommand),
    /// General settings
    #[command(subcommand)]
    Settings(DocumentCommand),
}

#[derive(Subcommand)]
enum RolesCommand {
    /// Permissions granted by a role
    Permissions { role_id: String },
    /// A user-role assignment with its role resolved
    Assignment { user_role_id: String },
}

#[derive(Subcommand)]
enum DocumentCommand {
    Show,
    /// Merge a JSON patch into the document
    Update { patch: String },
}

/// A collection operation, independent of the entity kind it runs on.
enum Action {
    List,
    Show { id: String },
    Search { term: String, field: String },
    Create { draft: String },
    Update { id: String, patch: String },
    Remove { id: String },
    CanRemove { id: String },
}

fn parse_json(input: &str) -> anyhow::Result<Value> {
    serde_json::from_str(input).context("argument is not valid JSON")
}

fn run<E: Registered>(registry: &mut ConsoleRegistry, action: Action) -> anyhow::Result<Value> {
    let output = match action {
        Action::List => serde_json::to_value(registry.store::<E>().list())?,
        Action::Show { id } => serde_json::to_value(registry.store::<E>().get(&id)?)?,
        Action::Search { term, field } => {
            let selector: FieldSelector<E::Field> = field.parse()?;
            serde_json::to_value(registry.store::<E>().filter(&term, selector))?
        }
        Action::Create { draft } => {
            let draft = parse_draft::<E>(parse_json(&draft)?)?;
            serde_json::to_value(registry.store_mut::<E>().create(draft)?)?
        }
        Action::Update { id, patch } => {
            let patch = Patch::from_value(parse_json(&patch)?)?;
            serde_json::to_value(registry.store_mut::<E>().update(&id, patch)?)?
        }
        Action::Remove { id } => {
            registry.store_mut::<E>().remove(&id)?;
            json!({ "removed": id })
        }
        Action::CanRemove { id } => {
            let decision = registry.store::<E>().can_remove(&id)?;
            let mut output = json!({ "id": id, "allowed": decision.is_allowed() });
            if let RemovalDecision::Denied(reason) = decision {
                output["reason"] = Value::from(reason.to_string());
            }
            output
        }
    };
    Ok(output)
}

fn dispatch(
    registry: &mut ConsoleRegistry,
    collection: &str,
    action: Action,
) -> anyhow::Result<Value> {
    match collection {
        DIAGNOSTIC_CODES => run::<DiagnosticCode>(registry, action),
        PROCEDURE_CODES => run::<ProcedureCode>(registry, action),
        MEDICATIONS => run::<Medication>(registry, action),
        MEDICAL_SUPPLIES => run::<MedicalSupply>(registry, action),
        PERMISSIONS => run::<Permission>(registry, action),
        ROLES => run::<Role>(registry, action),
        USER_ROLES => run::<UserRole>(registry, action),
        REFERRAL_TEMPLATES => run::<ReferralTemplate>(registry, action),
        MESSAGE_TEMPLATES => run::<MessageTemplate>(registry, action),
        SHARED_CALENDARS => run::<SharedCalendar>(registry, action),
        INTEGRATIONS => run::<Integration>(registry, action),
        COMMUNICATION_POLICIES => run::<CommunicationPolicy>(registry, action),
        OPERATING_HOURS => run::<OperatingHours>(registry, action),
        SERVICE_PRICES => run::<ServicePrice>(registry, action),
        other => Err(anyhow!(
            "unknown collection '{other}', run `hmc collections` to list them"
        )),
    }
}

fn document<T: SettingsKind>(
    document: &mut SettingsDocument<T>,
    command: DocumentCommand,
) -> anyhow::Result<Value> {
    let output = match command {
        DocumentCommand::Show => serde_json::to_value(document.document())?,
        DocumentCommand::Update { patch } => {
            let patch = Patch::from_value(parse_json(&patch)?)?;
            serde_json::to_value(document.update(patch)?)?
        }
    };
    Ok(output)
}

fn execute(registry: &mut ConsoleRegistry, command: Commands) -> anyhow::Result<Value> {
    match command {
        Commands::Collections => {
            let counts: serde_json::Map<String, Value> = registry
                .collection_counts()
                .into_iter()
                .map(|(name, count)| (name.to_string(), Value::from(count)))
                .collect();
            Ok(Value::Object(counts))
        }
        Commands::List { collection } => dispatch(registry, &collection, Action::List),
        Commands::Show { collection, id } => dispatch(registry, &collection, Action::Show { id }),
        Commands::Search {
            collection,
            term,
            field,
        } => dispatch(registry, &collection, Action::Search { term, field }),
        Commands::Create { collection, draft } => {
            dispatch(registry, &collection, Action::Create { draft })
        }
        Commands::Update {
            collection,
            id,
            patch,
        } => dispatch(registry, &collection, Action::Update { id, patch }),
        Commands::Remove { collection, id } => {
            dispatch(registry, &collection, Action::Remove { id })
        }
        Commands::CanRemove { collection, id } => {
            dispatch(registry, &collection, Action::CanRemove { id })
        }
        Commands::Roles(RolesCommand::Permissions { role_id }) => {
            Ok(serde_json::to_value(registry.role_permissions(&role_id)?)?)
        }
        Commands::Roles(RolesCommand::Assignment { user_role_id }) => {
            Ok(serde_json::to_value(registry.user_role_view(&user_role_id)?)?)
        }
        Commands::Profile(command) => document(registry.hospital_profile_mut(), command),
        Commands::Settings(command) => document(registry.general_settings_mut(), command),
    }
}

/// Resolves configuration from flags and `HMC_*` environment variables.
fn resolve_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| data_dir_from_env_value(std::env::var("HMC_DATA_DIR").ok()))
        .or_else(|| cli.persist.then(|| PathBuf::from(DEFAULT_DATA_DIR)));
    let id_strategy = id_strategy_from_env_value(std::env::var("HMC_ID_STRATEGY").ok())?;
    let seed_fixtures = bool_from_env_value(std::env::var("HMC_SEED_FIXTURES").ok(), true)?;

    Ok(CoreConfig::new(data_dir, id_strategy, seed_fixtures)?)
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("hmc=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    match config.data_dir() {
        Some(dir) => tracing::info!(
            "++ Opening console data in {} ({} ids)",
            dir.display(),
            config.id_strategy()
        ),
        None => tracing::info!(
            "++ Using in-memory console data ({} ids)",
            config.id_strategy()
        ),
    }
    let mut registry = ConsoleRegistry::open(&config)?;

    let output = execute(&mut registry, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
