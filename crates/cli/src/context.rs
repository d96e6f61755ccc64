use xui::PanelClient;

use crate::cli::PanelArgs;
use crate::error::Result;

/// Dependencies shared by every command handler.
///
/// Built once per process; handlers borrow the single [`PanelClient`].
pub struct CommandContext {
	pub client: PanelClient,
}

impl CommandContext {
	pub fn new(panel: &PanelArgs) -> Result<Self> {
		let client = PanelClient::new(panel.to_config())?;
		Ok(Self { client })
	}
}
