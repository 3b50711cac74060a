use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::info;

use crate::{config, error::Result};

/// The lamp on the Raspberry Pi relay.
///
/// Writes to the GPIO line's sysfs value file. Without one configured the
/// lamp only tracks its state (dev mode).
#[derive(Debug, Default)]
pub struct Lamp {
    on: Mutex<bool>,
    value_path: Option<PathBuf>,
}

impl Lamp {
    pub fn new(value_path: Option<PathBuf>) -> Self {
        Lamp {
            on: Mutex::new(false),
            value_path,
        }
    }

    pub fn from_config() -> Self {
        Self::new(config::lamp_gpio_value_path())
    }

    pub fn is_dev_mode(&self) -> bool {
        self.value_path.is_none()
    }

    /// Flips the lamp and returns a human readable status.
    pub async fn toggle(&self) -> Result<String> {
        let mut on = self.on.lock().await;
        let next = !*on;

        if let Some(path) = &self.value_path {
            async_fs::write(path, if next { "1" } else { "0" }).await?;
        }
        *on = next;

        let mut status = if next { "Lamp on" } else { "Lamp off" }.to_string();
        if self.is_dev_mode() {
            status.push_str(" (dev mode)");
        }
        info!("{}", status);
        Ok(status)
    }
}
