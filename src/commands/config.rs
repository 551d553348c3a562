use crate::error::Result;
use crate::settings::LauncherSettings;

pub async fn config_command(show: bool, reset: bool, settings: &LauncherSettings) -> Result<()> {
    let config_path = LauncherSettings::get_config_path();

    if reset {
        LauncherSettings::default().save()?;
        println!("✅ Launcher settings reset to defaults");
        println!("location: {}", config_path.display());
    } else if show {
        let settings_json = serde_json::to_string_pretty(settings)?;
        println!("Current launcher settings:");
        println!("{}", settings_json);
        println!("location: {}", config_path.display());
    } else {
        println!("Launcher settings file: {}", config_path.display());
        if !config_path.exists() {
            LauncherSettings::default().save()?;
            println!("✅ Created default launcher settings");
        }
    }

    Ok(())
}
