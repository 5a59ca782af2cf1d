//! Keyboard expert settings (repeat rate, delay, numlock, caps lock).

use serde::{Deserialize, Serialize, Serializer};

/// Expert settings, independent of the selected layout.
///
/// Values are kept as the strings stored in vconsole.conf; an empty
/// string means "not configured".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ExpertSettings {
    /// Keyboard repeat rate (e.g., "30")
    pub rate: String,
    /// Keyboard repeat delay in milliseconds (e.g., "250")
    pub delay: String,
    /// Numlock state at boot ("yes", "no", "bios" or empty)
    pub numlock: String,
    /// Caps Lock setting as stored ("yes", "no" or empty); only "yes" disables it
    #[serde(rename = "discaps", serialize_with = "serialize_discaps")]
    pub disable_caps_lock: String,
}

fn serialize_discaps<S: Serializer>(value: &str, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(value == "yes")
}

impl ExpertSettings {
    /// Applies a patch and returns whether any value actually changed.
    ///
    /// `rate` and `delay` are only taken when non-empty; `numlock` and
    /// `discaps` are taken whenever present.
    pub fn apply(&mut self, patch: &ExpertSettingsPatch) -> bool {
        let before = self.clone();

        if let Some(rate) = patch.rate.as_ref().filter(|r| !r.is_empty()) {
            self.rate.clone_from(rate);
        }
        if let Some(delay) = patch.delay.as_ref().filter(|d| !d.is_empty()) {
            self.delay.clone_from(delay);
        }
        if let Some(numlock) = &patch.numlock {
            self.numlock.clone_from(numlock);
        }
        if let Some(discaps) = patch.discaps {
            self.disable_caps_lock = if discaps { "yes" } else { "no" }.to_string();
        }

        !self.same_values(&before)
    }

    /// Whether Caps Lock is disabled.
    #[must_use]
    pub fn discaps(&self) -> bool {
        self.disable_caps_lock == "yes"
    }

    /// Compares the values as exposed to callers; an unset caps lock equals "no".
    fn same_values(&self, other: &Self) -> bool {
        self.rate == other.rate
            && self.delay == other.delay
            && self.numlock == other.numlock
            && self.discaps() == other.discaps()
    }

    /// Returns the fields of `self` that differ from `base`.
    #[must_use]
    pub fn diff_from(&self, base: &Self) -> ExpertSettingsPatch {
        ExpertSettingsPatch {
            rate: (self.rate != base.rate).then(|| self.rate.clone()),
            delay: (self.delay != base.delay).then(|| self.delay.clone()),
            numlock: (self.numlock != base.numlock).then(|| self.numlock.clone()),
            discaps: (self.discaps() != base.discaps()).then_some(self.discaps()),
        }
    }
}

/// A partial update of expert settings; also the export diff format.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExpertSettingsPatch {
    /// New repeat rate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rate: Option<String>,
    /// New repeat delay
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
    /// New numlock state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numlock: Option<String>,
    /// New caps lock flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discaps: Option<bool>,
}

impl ExpertSettingsPatch {
    /// True when the patch carries no value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rate.is_none() && self.delay.is_none() && self.numlock.is_none() && self.discaps.is_none()
    }
}
