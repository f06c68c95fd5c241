//! Desktop control through the usual Linux helper tools.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::command::{run_first_available, run_program, HELPER_TIMEOUT};
use super::{DesktopControl, HostError, HostResult};

/// Volume change requested by `/volume`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeAction {
    Up,
    Down,
    Set(u8),
}

impl VolumeAction {
    /// Parse `up`, `down` or `set N` (N in 0..=100, optional `%`).
    pub fn parse(input: &str) -> HostResult<Self> {
        let mut parts = input.split_whitespace();
        let action = parts.next().unwrap_or_default().to_lowercase();
        match action.as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            "set" => {
                let level = parts
                    .next()
                    .ok_or_else(|| HostError::Invalid("no volume level".to_string()))?;
                let level: u8 = level
                    .trim_end_matches('%')
                    .parse()
                    .map_err(|_| HostError::Invalid(format!("bad volume level '{}'", level)))?;
                if level > 100 {
                    return Err(HostError::Invalid(format!("volume {} is above 100", level)));
                }
                Ok(Self::Set(level))
            }
            _ => Err(HostError::Invalid(
                "expected up, down or set <0-100>".to_string(),
            )),
        }
    }

    /// Argument for `amixer set Master`.
    pub fn amixer_value(&self) -> String {
        match self {
            Self::Up => "5%+".to_string(),
            Self::Down => "5%-".to_string(),
            Self::Set(level) => format!("{}%", level),
        }
    }
}

/// Destructive power actions gated behind `confirm`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    Reboot,
    Shutdown,
}

const KEY_MAP: &[(&str, &str)] = &[
    ("ctrl", "Control"),
    ("alt", "Alt"),
    ("shift", "Shift"),
    ("win", "Super"),
    ("enter", "Return"),
    ("tab", "Tab"),
    ("esc", "Escape"),
    ("space", "space"),
    ("backspace", "BackSpace"),
    ("delete", "Delete"),
    ("up", "Up"),
    ("down", "Down"),
    ("left", "Left"),
    ("right", "Right"),
    ("f1", "F1"),
    ("f2", "F2"),
    ("f3", "F3"),
    ("f4", "F4"),
    ("f5", "F5"),
    ("f6", "F6"),
    ("f7", "F7"),
    ("f8", "F8"),
    ("f9", "F9"),
    ("f10", "F10"),
    ("f11", "F11"),
    ("f12", "F12"),
    ("vol_up", "XF86AudioRaiseVolume"),
    ("vol_down", "XF86AudioLowerVolume"),
    ("mute", "XF86AudioMute"),
    ("play_pause", "XF86AudioPlay"),
    ("next", "XF86AudioNext"),
    ("prev", "XF86AudioPrev"),
];

/// Translate `ctrl+alt+t` into xdotool key names. Unknown tokens pass through.
pub fn map_hotkey(input: &str) -> HostResult<Vec<String>> {
    let keys: Vec<String> = input
        .to_lowercase()
        .split('+')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(|k| {
            KEY_MAP
                .iter()
                .find(|(name, _)| *name == k)
                .map(|(_, xdo)| xdo.to_string())
                .unwrap_or_else(|| k.to_string())
        })
        .collect();
    if keys.is_empty() {
        return Err(HostError::Invalid("empty key combination".to_string()));
    }
    Ok(keys)
}

/// Wallpaper setter for the given `XDG_CURRENT_DESKTOP`.
pub fn wallpaper_command(desktop: &str, image: &Path) -> (&'static str, Vec<String>) {
    let desktop = desktop.to_uppercase();
    let image = image.to_string_lossy().into_owned();
    if desktop.contains("GNOME") {
        (
            "gsettings",
            vec![
                "set".to_string(),
                "org.gnome.desktop.background".to_string(),
                "picture-uri".to_string(),
                format!("file://{}", image),
            ],
        )
    } else if desktop.contains("KDE") {
        ("plasma-apply-wallpaperimage", vec![image])
    } else {
        ("feh", vec!["--bg-scale".to_string(), image])
    }
}

/// Screenshot tools in preference order, each writing to `target`.
pub fn screenshot_candidates(target: &Path) -> Vec<(&'static str, Vec<String>)> {
    let target = target.to_string_lossy().into_owned();
    vec![
        ("grim", vec![target.clone()]),
        ("gnome-screenshot", vec!["-f".to_string(), target.clone()]),
        ("scrot", vec!["--overwrite".to_string(), target.clone()]),
        ("import", vec!["-window".to_string(), "root".to_string(), target]),
    ]
}

/// `DesktopControl` for X11/Wayland sessions.
#[derive(Debug, Default, Clone)]
pub struct LinuxDesktop;

fn env_set(key: &str) -> bool {
    std::env::var_os(key).is_some_and(|v| !v.is_empty())
}

#[async_trait]
impl DesktopControl for LinuxDesktop {
    async fn screenshot(&self, dest_dir: &Path) -> HostResult<PathBuf> {
        if !env_set("DISPLAY") && !env_set("WAYLAND_DISPLAY") {
            return Err(HostError::Unavailable("no display".to_string()));
        }
        let target = dest_dir.join(format!(
            "screenshot-{}.png",
            chrono::Local::now().format("%Y%m%d-%H%M%S")
        ));
        run_first_available(&screenshot_candidates(&target), HELPER_TIMEOUT).await?;
        if !target.exists() {
            return Err(HostError::Failed("screenshot tool produced no file".to_string()));
        }
        Ok(target)
    }

    async fn send_hotkey(&self, keys: &[String]) -> HostResult<()> {
        let chord = keys.join("+");
        run_program("xdotool", &["key", &chord], HELPER_TIMEOUT).await?;
        Ok(())
    }

    async fn notify(&self, text: &str) -> HostResult<()> {
        run_program("notify-send", &["Remote Assistant", text], HELPER_TIMEOUT).await?;
        Ok(())
    }

    async fn set_volume(&self, action: VolumeAction) -> HostResult<()> {
        let value = action.amixer_value();
        run_program("amixer", &["set", "Master", &value], HELPER_TIMEOUT).await?;
        Ok(())
    }

    async fn lock_screen(&self) -> HostResult<()> {
        let candidates = vec![
            ("gnome-screensaver-command", vec!["-l".to_string()]),
            ("xdg-screensaver", vec!["lock".to_string()]),
        ];
        run_first_available(&candidates, HELPER_TIMEOUT)
            .await
            .map(|_| ())
            .map_err(|e| HostError::Unavailable(format!("no supported lock command found ({})", e)))
    }

    async fn set_wallpaper(&self, image: &Path) -> HostResult<()> {
        let desktop = std::env::var("XDG_CURRENT_DESKTOP").unwrap_or_default();
        let (program, args) = wallpaper_command(&desktop, image);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        run_program(program, &args, HELPER_TIMEOUT).await?;
        Ok(())
    }

    async fn power(&self, action: PowerAction) -> HostResult<()> {
        tracing::warn!("[Desktop] executing power action {:?}", action);
        match action {
            PowerAction::Reboot => run_program("reboot", &[], HELPER_TIMEOUT).await?,
            PowerAction::Shutdown => run_program("shutdown", &["now"], HELPER_TIMEOUT).await?,
        };
        Ok(())
    }
}
