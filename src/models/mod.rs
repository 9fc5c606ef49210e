pub mod settings;

pub use settings::{JobSettings, SettingsPatch};
