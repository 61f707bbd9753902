//! Developer CLI for lenskit: drives the session, publishing, and open-action
//! flows from a terminal using a local private-key wallet.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use alloy_primitives::{Address, U256};
use clap::{Parser, Subcommand};
use eyre::{eyre, Context, OptionExt};
use lenskit_core::actions::{Actor, AllowanceConfig};
use lenskit_core::config::{DEFAULT_ALLOWANCE_CURRENCY, DEFAULT_OPEN_ACTION_MODULE};
use lenskit_core::ipfs::StorageClient;
use lenskit_core::publisher::{MediaUpload, PostContent, Publisher};
use lenskit_core::session::Session;
use lenskit_core::store::FileTokenStore;
use lenskit_core::{
    ApiClient, Config, Environment, LocalWallet, SessionManager, Wallet,
};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(name = "lenskit", about = "Lens Protocol developer client", version)]
struct Cli {
    /// API deployment to talk to.
    #[arg(long, global = true, default_value = "testnet")]
    environment: String,

    /// Hex private key of the acting wallet.
    #[arg(long, global = true, env = "LENS_PRIVATE_KEY", hide_env_values = true)]
    private_key: Option<String>,

    /// JSON-RPC endpoint for direct transaction submission.
    #[arg(long, global = true, env = "LENS_RPC_URL")]
    rpc_url: Option<String>,

    /// IPFS project id for basic-auth gateways.
    #[arg(long, global = true, env = "IPFS_PROJECT_ID")]
    ipfs_project_id: Option<String>,

    /// IPFS project secret for basic-auth gateways.
    #[arg(long, global = true, env = "IPFS_PROJECT_SECRET", hide_env_values = true)]
    ipfs_project_secret: Option<String>,

    /// Profile to act as; defaults to the first profile the wallet manages.
    #[arg(long, global = true)]
    profile_id: Option<String>,

    /// Token store path; defaults to the platform data directory.
    #[arg(long, global = true)]
    token_store: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate and print the bearer token pair.
    Login,
    /// Create a post, optionally with a media attachment.
    Post {
        /// Post body.
        text: String,
        /// Media file to attach.
        #[arg(long)]
        media: Option<PathBuf>,
        /// MIME type of the attachment.
        #[arg(long, default_value = "video/mp4")]
        media_type: String,
        /// Handle used for the document's external URL.
        #[arg(long)]
        handle: Option<String>,
    },
    /// Act on a publication through an open-action module and relay the
    /// signed payload.
    Act {
        /// Publication to act on (e.g. `0x01-0x02`).
        publication_id: String,
        /// Open-action module address.
        #[arg(long)]
        module: Option<String>,
        /// Hex-encoded action data.
        #[arg(long, default_value = "0x")]
        data: String,
        /// Required module allowance in whole tokens; the approval is only
        /// submitted when the current allowance is below it.
        #[arg(long, default_value_t = 25)]
        allowance: u64,
        /// Skip the allowance check entirely.
        #[arg(long)]
        skip_allowance: bool,
    },
    /// List publications carrying the open-action module.
    Publications {
        /// Author profile; defaults to the acting profile.
        #[arg(long)]
        from: Option<String>,
        /// Open-action module address to filter by.
        #[arg(long)]
        module: Option<String>,
    },
}

struct App {
    api: Arc<ApiClient>,
    storage: Arc<StorageClient>,
    wallet: Arc<LocalWallet>,
    manager: SessionManager,
    config: Config,
    profile_id: Option<String>,
    cancel: CancellationToken,
}

impl App {
    fn new(cli: &Cli) -> eyre::Result<Self> {
        let environment = Environment::from_str(&cli.environment)
            .map_err(|_| eyre!("unknown environment `{}`", cli.environment))?;
        let mut config = Config::for_environment(&environment);
        config.rpc_url = cli.rpc_url.clone();
        config.ipfs.project_id = cli.ipfs_project_id.clone();
        config.ipfs.project_secret = cli.ipfs_project_secret.clone();

        let key = cli
            .private_key
            .as_deref()
            .ok_or_eyre("no private key; pass --private-key or set LENS_PRIVATE_KEY")?;
        let wallet = Arc::new(LocalWallet::from_hex_key(key, config.rpc_url.clone())?);

        let store_path = cli.token_store.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lenskit")
                .join("tokens.json")
        });
        let store = Arc::new(FileTokenStore::open(store_path)?);

        let api = Arc::new(ApiClient::new(&config));
        let storage = Arc::new(StorageClient::new(&config.ipfs, config.upload_timeout));
        let manager = SessionManager::new(
            Arc::clone(&api),
            Arc::clone(&wallet) as Arc<dyn Wallet>,
            store,
        );

        Ok(Self {
            api,
            storage,
            wallet,
            manager,
            config,
            profile_id: cli.profile_id.clone(),
            cancel: CancellationToken::new(),
        })
    }

    async fn resolve_profile(&self, address: Address) -> eyre::Result<String> {
        if let Some(profile_id) = &self.profile_id {
            return Ok(profile_id.clone());
        }
        let profiles = self.api.profiles_managed(address, &self.cancel).await?;
        let profile = profiles
            .first()
            .ok_or_eyre("the wallet manages no profiles; pass --profile-id")?;
        if let Some(handle) = &profile.handle {
            tracing::debug!(profile = %profile.id, handle = %handle.full_handle, "resolved profile");
        }
        Ok(profile.id.clone())
    }

    async fn login(&self) -> eyre::Result<Session> {
        let address = self.manager.connect().await?;
        let profile_id = self.resolve_profile(address).await?;
        let session = self
            .manager
            .login(address, &profile_id, &self.cancel)
            .await
            .wrap_err("login failed")?;
        Ok(session)
    }
}

fn parse_address(value: Option<&str>, fallback: Address) -> eyre::Result<Address> {
    value.map_or(Ok(fallback), |text| {
        Address::from_str(text).wrap_err_with(|| format!("invalid address `{text}`"))
    })
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let app = App::new(&cli)?;

    match &cli.command {
        Command::Login => {
            let session = app.login().await?;
            println!("address:       {}", session.wallet_address);
            println!("profile:       {}", session.profile_id);
            println!("access token:  {}", session.access_token());
            println!("refresh token: {}", session.tokens.refresh_token);
        }
        Command::Post {
            text,
            media,
            media_type,
            handle,
        } => {
            let session = app.login().await?;
            let media = match media {
                Some(path) => Some(MediaUpload {
                    bytes: std::fs::read(path)
                        .wrap_err_with(|| format!("reading {}", path.display()))?,
                    mime_type: media_type.clone(),
                    filename: path
                        .file_name()
                        .map_or_else(|| "media".to_string(), |name| name.to_string_lossy().into_owned()),
                }),
                None => None,
            };
            let publisher = Publisher::new(
                Arc::clone(&app.api),
                Arc::clone(&app.storage),
                Arc::clone(&app.wallet) as Arc<dyn Wallet>,
                &app.config,
            );
            let tx_hash = publisher
                .create_post(
                    &session,
                    &PostContent {
                        text: text.clone(),
                        media,
                        author_handle: handle.clone(),
                    },
                    &app.cancel,
                )
                .await?;
            println!("post submitted: {tx_hash}");
        }
        Command::Act {
            publication_id,
            module,
            data,
            allowance,
            skip_allowance,
        } => {
            let session = app.login().await?;
            let module = parse_address(module.as_deref(), DEFAULT_OPEN_ACTION_MODULE)?;
            let allowance_config = (!skip_allowance).then(|| AllowanceConfig {
                currency: DEFAULT_ALLOWANCE_CURRENCY,
                module,
                amount: U256::from(*allowance)
                    * U256::from(10u64).pow(U256::from(18u64)),
            });

            let actor = Actor::new(
                Arc::clone(&app.api),
                Arc::clone(&app.wallet) as Arc<dyn Wallet>,
            );
            let act = actor
                .act(
                    &session,
                    publication_id,
                    module,
                    data,
                    allowance_config.as_ref(),
                    &app.cancel,
                )
                .await?;
            match actor.broadcast(&session, &act, &app.cancel).await? {
                lenskit_core::api::RelayResult::Success { tx_hash, tx_id } => {
                    println!(
                        "relayed: tx_hash={} tx_id={}",
                        tx_hash.unwrap_or_default(),
                        tx_id.unwrap_or_default()
                    );
                }
                lenskit_core::api::RelayResult::Error { reason } => {
                    println!("relay refused: {reason}");
                }
            }
        }
        Command::Publications { from, module } => {
            let from_profile = match from {
                Some(profile) => profile.clone(),
                None => {
                    let address = app.manager.connect().await?;
                    app.resolve_profile(address).await?
                }
            };
            let module = parse_address(module.as_deref(), DEFAULT_OPEN_ACTION_MODULE)?;
            let publications = app
                .api
                .publications(&from_profile, module, &app.cancel)
                .await?;
            if publications.is_empty() {
                println!("no publications");
            }
            for publication in publications {
                let app_id = publication
                    .published_on
                    .map_or_else(|| "-".to_string(), |published_on| published_on.id);
                let modules = publication
                    .open_action_modules
                    .iter()
                    .filter_map(|settings| settings.contract.as_ref())
                    .map(|contract| contract.address.clone())
                    .collect::<Vec<_>>()
                    .join(",");
                println!("{}  app={app_id}  modules=[{modules}]", publication.id);
            }
        }
    }

    Ok(())
}
