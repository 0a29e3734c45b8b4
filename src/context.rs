use anyhow::{Context as _, Result};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use fieldops_core::config::{DisplayPrefs, FieldOpsConfig, Session};
use fieldops_core::date_range::parse_day;
use fieldops_provider_espocrm::Aggregator;

/// Settings every view command starts from
pub struct Context {
    pub config: FieldOpsConfig,
    pub prefs: DisplayPrefs,
    pub tz: Tz,
    pub today: NaiveDate,
}

impl Context {
    pub fn load() -> Result<Self> {
        let config = FieldOpsConfig::load().context("Could not load config.toml")?;
        let tz = config.timezone()?;
        let prefs = DisplayPrefs::load().context("Could not load display.toml")?;
        let today = Utc::now().with_timezone(&tz).date_naive();

        Ok(Context {
            config,
            prefs,
            tz,
            today,
        })
    }

    /// Reads the session token and builds the EspoCRM aggregator
    pub fn aggregator(&self) -> Result<Aggregator> {
        let session = Session::load()?;
        let token = session.token()?;
        if let Some(name) = session.display_name() {
            tracing::debug!(user = name, "using stored session");
        }

        Ok(Aggregator::from_config(&self.config, token)?)
    }

    /// The date argument of a view, today when absent
    pub fn parse_date(&self, arg: Option<&str>) -> Result<NaiveDate> {
        match arg {
            Some(s) => Ok(parse_day(s, self.today)?),
            None => Ok(self.today),
        }
    }
}
