//! Command-line front-end driving the pet-finder client against a backend.
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use config::Config;
use dotenvy::dotenv;
use thiserror::Error;
use validator::Validate;

use petfinder_client::api::{ApiClient, ApiError};
use petfinder_client::domain::{ContentType, FileName, PetId, PhotoId, ReportId, SelectedFile};
use petfinder_client::dto::{
    ApiResponse, Coordinates, FilterType, NearbyReport, NotificationFilter, ResponseStatus,
};
use petfinder_client::forms::FieldError;
use petfinder_client::forms::health::{self, HealthRecord};
use petfinder_client::forms::pet::{self, PetDetails};
use petfinder_client::forms::report::{self, ReportDetails};
use petfinder_client::forms::user::{self, UserProfile};
use petfinder_client::models::auth::InitData;
use petfinder_client::models::config::ClientConfig;
use petfinder_client::navigation::NavigationStack;
use petfinder_client::services::ServiceError;
use petfinder_client::services::submission::{FormController, SubmitError};
use petfinder_client::theme::ThemeParams;

#[derive(Debug, Error)]
enum CliError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{} is not a file name", .0.display())]
    BadPath(PathBuf),
    #[error("malformed JSON in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("init data is not configured")]
    MissingInitData,
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Service(#[from] ServiceError),
    #[error(transparent)]
    Field(#[from] FieldError),
    #[error(transparent)]
    Submit(#[from] SubmitError),
}

#[derive(Debug, Parser)]
#[command(name = "petfinder", version, about = "Pet-finder mini-app client")]
struct Cli {
    /// Init token issued by the host client; overrides configuration.
    #[arg(long, global = true)]
    init_data: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exchange the init token for a session.
    Auth {
        /// Authenticate from a report notification.
        #[arg(long)]
        report: Option<i64>,
    },
    /// Create a pet with photos.
    AddPet(PetArgs),
    /// Update a stored pet.
    UpdatePet(UpdatePetArgs),
    /// Delete a pet.
    DeletePet { id: i64 },
    /// Create a lost/found report with photos.
    AddReport(ReportArgs),
    /// Update a stored report.
    UpdateReport(UpdateReportArgs),
    /// Delete a report.
    DeleteReport { id: i64 },
    /// Update the profile fields.
    UpdateProfile(ProfileArgs),
    /// Update vaccination and treatment dates of a pet.
    UpdateHealth(HealthArgs),
    /// Choose which reports trigger notifications.
    NotifyFilter {
        filter_type: FilterType,
        /// Radius in kilometres, used with the `radius` filter.
        #[arg(long, default_value_t = 5)]
        radius_km: u32,
    },
    /// List active reports near the user.
    Nearby {
        #[arg(long, default_value_t = FilterType::Radius)]
        filter: FilterType,
    },
    /// Resolve coordinates to a city name.
    City {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Resolve a city name and store it as the profile location.
    Locate { city: String },
    /// Send the device location during registration.
    RegisterLocation {
        #[arg(long, allow_hyphen_values = true)]
        lat: f64,
        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
    /// Record a visited page.
    Visit { path: String },
    /// Resolve the back button on a page.
    Back {
        current: String,
        #[arg(long)]
        back_url: Option<String>,
    },
    /// Print CSS variables for host theme parameters given as JSON.
    Theme { params: String },
}

#[derive(Debug, Args)]
struct PetArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    breed: String,
    #[arg(long)]
    age: String,
    #[arg(long)]
    color: String,
    #[arg(long)]
    description: String,
    /// Photo files.
    #[arg(required = true)]
    photos: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct PhotoEdits {
    /// Stored photo ids shown on the edit page.
    #[arg(long = "existing-photo")]
    existing: Vec<i64>,
    /// Stored photo ids to delete.
    #[arg(long = "delete-photo")]
    delete: Vec<i64>,
    /// New photo files.
    #[arg(long = "photo")]
    photos: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct UpdatePetArgs {
    id: i64,
    /// JSON file with the stored values.
    #[arg(long)]
    from: Option<PathBuf>,
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    breed: Option<String>,
    #[arg(long)]
    age: Option<String>,
    #[arg(long)]
    color: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[command(flatten)]
    photos: PhotoEdits,
}

#[derive(Debug, Args)]
struct ReportArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    content: String,
    #[arg(long)]
    location: String,
    #[arg(long)]
    region: String,
    #[arg(long)]
    pet: i64,
    #[arg(required = true)]
    photos: Vec<PathBuf>,
}

#[derive(Debug, Args)]
struct UpdateReportArgs {
    id: i64,
    #[arg(long)]
    from: Option<PathBuf>,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    content: Option<String>,
    #[command(flatten)]
    photos: PhotoEdits,
}

#[derive(Debug, Args)]
struct ProfileArgs {
    #[arg(long)]
    from: Option<PathBuf>,
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    phone: Option<String>,
}

#[derive(Debug, Args)]
struct HealthArgs {
    pet: i64,
    #[arg(long)]
    from: Option<PathBuf>,
    #[arg(long)]
    last_vaccination: Option<String>,
    #[arg(long)]
    next_vaccination: Option<String>,
    #[arg(long)]
    last_parasite_treatment: Option<String>,
    #[arg(long)]
    next_parasite_treatment: Option<String>,
    #[arg(long)]
    last_fleas_ticks_treatment: Option<String>,
    #[arg(long)]
    next_fleas_ticks_treatment: Option<String>,
}

fn read_photos(paths: &[PathBuf]) -> Result<Vec<SelectedFile>, CliError> {
    paths
        .iter()
        .map(|path| {
            let name = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| CliError::BadPath(path.clone()))
                .and_then(|n| {
                    FileName::try_from_str(n).map_err(|_| CliError::BadPath(path.clone()))
                })?;
            let bytes = fs::read(path).map_err(|source| CliError::Read {
                path: path.clone(),
                source,
            })?;
            let content_type = ContentType::guess(&name);
            Ok(SelectedFile::new(name, content_type, bytes))
        })
        .collect()
}

fn read_details<T: serde::de::DeserializeOwned + Default>(
    path: Option<&Path>,
) -> Result<T, CliError> {
    let Some(path) = path else {
        return Ok(T::default());
    };
    let raw = fs::read(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&raw).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn apply(
    form: &mut FormController,
    values: impl IntoIterator<Item = (&'static str, Option<String>)>,
) -> Result<(), FieldError> {
    for (key, value) in values {
        if let Some(value) = value {
            form.input(key, value)?;
        }
    }
    Ok(())
}

async fn attach_photos(form: &mut FormController, paths: &[PathBuf]) -> Result<(), CliError> {
    if paths.is_empty() {
        return Ok(());
    }
    form.select_files(read_photos(paths)?)?;
    if let Some(report) = form.settle().await? {
        for notice in report.notices() {
            log::warn!("{notice}");
        }
    }
    Ok(())
}

async fn delete_photos(
    form: &mut FormController,
    client: &ApiClient,
    ids: &[i64],
) -> Result<(), CliError> {
    for id in ids {
        form.delete_existing_photo(client, PhotoId::new(*id)).await?;
    }
    Ok(())
}

async fn submit(form: &mut FormController, client: &ApiClient) -> Result<(), CliError> {
    match form.submit(client).await {
        Ok(confirmation) => {
            println!("{}", confirmation.message);
            if let Some(url) = confirmation.redirect_url {
                println!("{url}");
            }
            Ok(())
        }
        Err(SubmitError::Invalid(errors)) => {
            for (field, message) in &errors {
                log::error!("{field}: {message}");
            }
            Err(SubmitError::Invalid(errors).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn print_reply(reply: ApiResponse, fallback: &str) -> Result<(), CliError> {
    match reply.status {
        Some(ResponseStatus::Success) => {
            println!("{}", reply.message.as_deref().unwrap_or(fallback));
            Ok(())
        }
        _ => Err(ServiceError::Server(
            reply
                .message
                .unwrap_or_else(|| "Ошибка при отправке данных на сервер".to_string()),
        )
        .into()),
    }
}

fn print_nearby(reports: &[NearbyReport]) {
    if reports.is_empty() {
        println!("Объявления не найдены");
        return;
    }
    for report in reports {
        println!(
            "#{} {} [{}]",
            report.report_id,
            report.report_title,
            report.report_status.label()
        );
        println!(
            "    Город: {}, {}",
            report.report_region,
            report.distance_label()
        );
        if !report.report_content.is_empty() {
            println!("    {}", report.report_content);
        }
    }
}

async fn connect(
    config: &ClientConfig,
    init_data: Option<InitData>,
) -> Result<ApiClient, CliError> {
    let client = ApiClient::from_config(config)?;
    match init_data {
        Some(token) => {
            client.authenticate(&token).await?;
        }
        None => log::warn!("no init data configured, continuing without a session"),
    }
    Ok(client)
}

async fn run(
    command: Command,
    config: ClientConfig,
    init_data: Option<InitData>,
) -> Result<(), CliError> {
    let limits = config.upload_limits();

    match command {
        Command::Auth { report } => {
            let token = init_data.ok_or(CliError::MissingInitData)?;
            let client = ApiClient::from_config(&config)?;
            let redirect = match report {
                Some(id) => {
                    client
                        .authenticate_for_report(&token, ReportId::new(id))
                        .await?
                }
                None => client.authenticate(&token).await?,
            };
            println!("{}", redirect.as_str());
        }
        Command::AddPet(args) => {
            let client = connect(&config, init_data).await?;
            let mut form = FormController::create_pet(limits);
            apply(
                &mut form,
                [
                    (pet::NAME, Some(args.name)),
                    (pet::BREED, Some(args.breed)),
                    (pet::AGE, Some(args.age)),
                    (pet::COLOR, Some(args.color)),
                    (pet::DESCRIPTION, Some(args.description)),
                ],
            )?;
            attach_photos(&mut form, &args.photos).await?;
            submit(&mut form, &client).await?;
        }
        Command::UpdatePet(args) => {
            let client = connect(&config, init_data).await?;
            let details: PetDetails = read_details(args.from.as_deref())?;
            let existing = args.photos.existing.iter().copied().map(PhotoId::new).collect();
            let mut form =
                FormController::edit_pet(PetId::new(args.id), &details, existing, limits)?;
            apply(
                &mut form,
                [
                    (pet::NAME, args.name),
                    (pet::BREED, args.breed),
                    (pet::AGE, args.age),
                    (pet::COLOR, args.color),
                    (pet::DESCRIPTION, args.description),
                ],
            )?;
            delete_photos(&mut form, &client, &args.photos.delete).await?;
            attach_photos(&mut form, &args.photos.photos).await?;
            submit(&mut form, &client).await?;
        }
        Command::DeletePet { id } => {
            let client = connect(&config, init_data).await?;
            let reply = client.delete_pet(PetId::new(id)).await?;
            print_reply(reply, "Питомец удалён")?;
        }
        Command::AddReport(args) => {
            let client = connect(&config, init_data).await?;
            let mut form = FormController::create_report(limits);
            apply(
                &mut form,
                [
                    (report::TITLE, Some(args.title)),
                    (report::CONTENT, Some(args.content)),
                    (report::LOCATION, Some(args.location)),
                    (report::REGION, Some(args.region)),
                ],
            )?;
            form.select_pet(PetId::new(args.pet))?;
            attach_photos(&mut form, &args.photos).await?;
            submit(&mut form, &client).await?;
        }
        Command::UpdateReport(args) => {
            let client = connect(&config, init_data).await?;
            let details: ReportDetails = read_details(args.from.as_deref())?;
            let existing = args.photos.existing.iter().copied().map(PhotoId::new).collect();
            let mut form =
                FormController::edit_report(ReportId::new(args.id), &details, existing, limits)?;
            apply(
                &mut form,
                [(report::TITLE, args.title), (report::CONTENT, args.content)],
            )?;
            delete_photos(&mut form, &client, &args.photos.delete).await?;
            attach_photos(&mut form, &args.photos.photos).await?;
            submit(&mut form, &client).await?;
        }
        Command::DeleteReport { id } => {
            let client = connect(&config, init_data).await?;
            let reply = client.delete_report(ReportId::new(id)).await?;
            print_reply(reply, "Объявление успешно удалено!")?;
        }
        Command::UpdateProfile(args) => {
            let client = connect(&config, init_data).await?;
            let profile: UserProfile = read_details(args.from.as_deref())?;
            let mut form = FormController::edit_profile(&profile)?;
            apply(
                &mut form,
                [
                    (user::FIRST_NAME, args.first_name),
                    (user::LAST_NAME, args.last_name),
                    (user::PHONE, args.phone),
                ],
            )?;
            submit(&mut form, &client).await?;
        }
        Command::UpdateHealth(args) => {
            let client = connect(&config, init_data).await?;
            let record: HealthRecord = read_details(args.from.as_deref())?;
            let mut form = FormController::edit_health(PetId::new(args.pet), &record)?;
            apply(
                &mut form,
                [
                    (health::LAST_VACCINATION, args.last_vaccination),
                    (health::NEXT_VACCINATION, args.next_vaccination),
                    (health::LAST_PARASITE_TREATMENT, args.last_parasite_treatment),
                    (health::NEXT_PARASITE_TREATMENT, args.next_parasite_treatment),
                    (
                        health::LAST_FLEAS_TICKS_TREATMENT,
                        args.last_fleas_ticks_treatment,
                    ),
                    (
                        health::NEXT_FLEAS_TICKS_TREATMENT,
                        args.next_fleas_ticks_treatment,
                    ),
                ],
            )?;
            submit(&mut form, &client).await?;
        }
        Command::NotifyFilter {
            filter_type,
            radius_km,
        } => {
            let client = connect(&config, init_data).await?;
            let filter = NotificationFilter::new(filter_type, radius_km);
            let reply = client.update_filter(&filter).await?;
            print_reply(reply, "Настройки уведомлений успешно сохранены!")?;
        }
        Command::Nearby { filter } => {
            let client = connect(&config, init_data).await?;
            print_nearby(&client.nearby_reports(filter).await?);
        }
        Command::City { lat, lon } => {
            let client = connect(&config, init_data).await?;
            println!("{}", client.city_name(Coordinates { lat, lon }).await?);
        }
        Command::Locate { city } => {
            let client = connect(&config, init_data).await?;
            let at = client.city_coords(&city).await?;
            let reply = client.update_user_location(at).await?;
            print_reply(reply, &format!("Город {city} сохранён."))?;
        }
        Command::RegisterLocation { lat, lon } => {
            let client = connect(&config, init_data).await?;
            let reply = client.save_location(Coordinates { lat, lon }).await?;
            print_reply(reply, "Местоположение сохранено")?;
        }
        Command::Visit { path } => {
            let mut stack = NavigationStack::load(&config.navigation_store)?;
            if petfinder_client::navigation::is_main_page(&path) {
                stack.enter_main_page(&path);
            } else {
                stack.save_current(&path);
            }
            stack.save(&config.navigation_store)?;
        }
        Command::Back { current, back_url } => {
            let mut stack = NavigationStack::load(&config.navigation_store)?;
            if !stack.has_back_target(&current, back_url.as_deref()) {
                log::info!("back button hidden on {current}");
                return Ok(());
            }
            let action = stack.back_target(&current, back_url.as_deref());
            stack.save(&config.navigation_store)?;
            println!("{}", action.target);
        }
        Command::Theme { params } => {
            let theme: ThemeParams =
                serde_json::from_str(&params).map_err(|source| CliError::Json {
                    path: PathBuf::from("<argument>"),
                    source,
                })?;
            print!("{}", theme.to_css());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load environment variables from `.env` in local development.
    dotenv().ok();
    // Initialize logger with default level INFO if not provided.
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let cli = Cli::parse();

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    let client_config = match settings.try_deserialize::<ClientConfig>() {
        Ok(client_config) => client_config,
        Err(err) => {
            log::error!("Error loading client config: {}", err);
            std::process::exit(1);
        }
    };

    if let Err(err) = client_config.validate() {
        log::error!("Invalid client config: {}", err);
        std::process::exit(1);
    }

    let init_data = cli
        .init_data
        .or_else(|| client_config.init_data.clone())
        .and_then(InitData::new);

    if let Err(err) = run(cli.command, client_config, init_data).await {
        log::error!("{}", err);
        std::process::exit(1);
    }
}
