use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use xui::{PanelConfig, Protocol};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "xui")]
#[command(about = "Manage inbounds and clients on a 3x-ui panel")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short = 'f', long, global = true, value_enum, default_value_t = OutputFormat::Json)]
	pub format: OutputFormat,

	#[command(flatten)]
	pub panel: PanelArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Connection settings, from flags or the environment.
#[derive(Args, Debug, Clone)]
pub struct PanelArgs {
	/// Panel host, with or without scheme
	#[arg(long = "panel-host", global = true, env = "XUI_HOST", default_value = "http://127.0.0.1")]
	pub panel_host: String,

	/// Panel port
	#[arg(long = "panel-port", global = true, env = "XUI_PORT", default_value_t = 2053)]
	pub panel_port: u16,

	#[arg(long, global = true, env = "XUI_USERNAME", default_value = "admin")]
	pub username: String,

	#[arg(long, global = true, env = "XUI_PASSWORD", default_value = "admin", hide_env_values = true, hide_default_value = true)]
	pub password: String,

	/// Secret web base path configured on the panel
	#[arg(long = "root", global = true, env = "XUI_ROOT", value_name = "PATH")]
	pub root_path: Option<String>,

	/// Per-request timeout in seconds
	#[arg(long, global = true, env = "XUI_TIMEOUT_SECS", default_value_t = 10)]
	pub timeout_secs: u64,

	/// Public address placed in generated links
	#[arg(long, global = true, env = "HOME_IP")]
	pub home_ip: Option<String>,
}

impl PanelArgs {
	pub fn to_config(&self) -> PanelConfig {
		let mut config = PanelConfig::new(&self.panel_host, self.panel_port, &self.username, &self.password)
			.with_timeout(Duration::from_secs(self.timeout_secs.max(1)));
		if let Some(root) = &self.root_path {
			config = config.with_root_path(root);
		}
		if let Some(ip) = &self.home_ip {
			config = config.with_home_ip(ip);
		}
		config
	}
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Inbound management
	#[command(alias = "in")]
	Inbounds {
		#[command(subcommand)]
		action: InboundAction,
	},

	/// Client management
	#[command(alias = "cl")]
	Clients {
		#[command(subcommand)]
		action: ClientAction,
	},

	/// Check the panel address, credentials, and inbound listing
	Doctor,
}

#[derive(Subcommand, Debug)]
pub enum InboundAction {
	/// List all inbounds
	#[command(alias = "ls")]
	List,

	/// Show one inbound
	Get { id: i64 },

	/// Create an inbound with one generated client
	Add {
		remark: String,
		/// Listen port (random in 10000-60000 when omitted)
		#[arg(long)]
		port: Option<u16>,
		#[arg(long, default_value = "vless")]
		protocol: InboundProtocol,
	},

	/// Delete an inbound and all of its clients
	#[command(alias = "rm")]
	Del { id: i64 },
}

/// Protocols `inbounds add` has a settings template for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum InboundProtocol {
	Vless,
}

impl From<InboundProtocol> for Protocol {
	fn from(value: InboundProtocol) -> Self {
		match value {
			InboundProtocol::Vless => Protocol::Vless,
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum ClientAction {
	/// List clients of every inbound with their traffic
	#[command(alias = "ls")]
	List,

	/// Show which inbound holds a client
	Find { uuid: String },

	/// Add a client to an inbound
	Add {
		inbound_id: i64,
		email: String,
		/// Client UUID (random v4 when omitted)
		#[arg(long)]
		uuid: Option<String>,
	},

	/// Delete a client by UUID
	#[command(alias = "rm")]
	Del { uuid: String },

	/// Print the share link of a client
	Link {
		uuid: String,
		/// Host to put in the link instead of HOME_IP or the panel host
		#[arg(long)]
		host: Option<String>,
	},
}

impl Commands {
	/// Stable name reported in the output envelope.
	pub fn name(&self) -> &'static str {
		match self {
			Commands::Inbounds { action } => match action {
				InboundAction::List => "inbounds list",
				InboundAction::Get { .. } => "inbounds get",
				InboundAction::Add { .. } => "inbounds add",
				InboundAction::Del { .. } => "inbounds del",
			},
			Commands::Clients { action } => match action {
				ClientAction::List => "clients list",
				ClientAction::Find { .. } => "clients find",
				ClientAction::Add { .. } => "clients add",
				ClientAction::Del { .. } => "clients del",
				ClientAction::Link { .. } => "clients link",
			},
			Commands::Doctor => "doctor",
		}
	}
}
