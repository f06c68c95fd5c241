//! Command Router
//!
//! The fixed command vocabulary as a table of [`CommandSpec`] records and a
//! stateless parser that turns message text into a command plus inline
//! argument, or plain text.

use super::i18n::{fill, text, Language, Text};

/// Every command the agent understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Help,
    Info,
    Logs,
    Shell,
    SudoPass,
    ClearSudo,
    Processes,
    Kill,
    Download,
    Upload,
    Cd,
    CdParent,
    Pwd,
    Screenshot,
    Play,
    PauseAudio,
    ResumeAudio,
    StopAudio,
    Hotkey,
    Language,
    Reboot,
    Shutdown,
    Notify,
    Volume,
    Mkdir,
    Rm,
    Lock,
    Uptime,
    Who,
    Top,
    Disks,
    Memory,
    AuthLog,
    Sessions,
}

/// How a command treats its inline argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Argument {
    /// Ignored
    None,
    /// Missing argument arms a prompt for the next message
    Required,
    /// Missing argument only prints the usage text
    Optional,
    /// Runs only with the literal argument `confirm`; never arms a prompt
    Confirm,
}

/// Literal argument that unlocks [`Argument::Confirm`] commands.
pub const CONFIRM_WORD: &str = "confirm";

/// One row of the command table.
#[derive(Debug)]
pub struct CommandSpec {
    pub token: &'static str,
    pub kind: CommandKind,
    pub argument: Argument,
    /// Usage prompt or confirmation request
    pub prompt: Option<Text>,
    pub help_en: &'static str,
    pub help_ru: &'static str,
}

impl CommandSpec {
    pub fn help(&self, lang: Language) -> &'static str {
        match lang {
            Language::En => self.help_en,
            Language::Ru => self.help_ru,
        }
    }
}

macro_rules! command {
    ($token:literal, $kind:ident, $arg:ident, $prompt:expr, $en:literal, $ru:literal) => {
        CommandSpec {
            token: $token,
            kind: CommandKind::$kind,
            argument: Argument::$arg,
            prompt: $prompt,
            help_en: $en,
            help_ru: $ru,
        }
    };
}

pub static COMMANDS: &[CommandSpec] = &[
    command!("start", Help, None, None, "🏁 /start - Show this message", "🏁 /start - Показать это сообщение"),
    command!("info", Info, None, None, "🔍 /info - System information", "🔍 /info - Информация о системе"),
    command!("logs", Logs, None, None, "📊 /logs - Get logs", "📊 /logs - Получить логи"),
    command!("shell", Shell, Required, Some(Text::ShellUsage), "💻 /shell - Execute command", "💻 /shell - Выполнить команду"),
    command!("sudo_pass", SudoPass, Required, Some(Text::SudoPassUsage), "🔐 /sudo_pass - Set sudo password", "🔐 /sudo_pass - Установить пароль для sudo"),
    command!("clear_sudo", ClearSudo, None, None, "🧹 /clear_sudo - Clear sudo password", "🧹 /clear_sudo - Очистить пароль sudo"),
    command!("ps", Processes, None, None, "📋 /ps - Running processes", "📋 /ps - Запущенные процессы"),
    command!("kill", Kill, Required, Some(Text::KillUsage), "❌ /kill - Kill processes", "❌ /kill - Завершить процессы"),
    command!("download", Download, Required, Some(Text::DownloadUsage), "📥 /download - Download file", "📥 /download - Скачать файл"),
    command!("upload", Upload, Optional, Some(Text::UploadUsage), "📤 /upload - Upload file", "📤 /upload - Загрузить файл"),
    command!("cd", Cd, Required, Some(Text::CdUsage), "📁 /cd - Change directory", "📁 /cd - Сменить директорию"),
    command!("cd_parent", CdParent, None, None, "↩️ /cd_parent - Go up", "↩️ /cd_parent - На уровень выше"),
    command!("pwd", Pwd, None, None, "📂 /pwd - Directory contents", "📂 /pwd - Содержимое директории"),
    command!("screenshot", Screenshot, None, None, "📸 /screenshot - Screenshot", "📸 /screenshot - Скриншот"),
    command!("play", Play, None, Some(Text::PlayUsage), "🎵 /play - Play audio", "🎵 /play - Воспроизвести аудио"),
    command!("pause_audio", PauseAudio, None, None, "⏸️ /pause_audio - Pause audio", "⏸️ /pause_audio - Пауза аудио"),
    command!("resume_audio", ResumeAudio, None, None, "▶️ /resume_audio - Resume audio", "▶️ /resume_audio - Возобновить аудио"),
    command!("stop_audio", StopAudio, None, None, "⏹️ /stop_audio - Stop audio", "⏹️ /stop_audio - Остановить аудио"),
    command!("hotkey", Hotkey, Required, Some(Text::HotkeyUsage), "⌨️ /hotkey - Emulate keys", "⌨️ /hotkey - Эмуляция клавиш"),
    command!("language", Language, None, None, "🌍 /language - Change language", "🌍 /language - Сменить язык"),
    command!("reboot", Reboot, Confirm, Some(Text::RebootConfirm), "🔁 /reboot - Reboot system", "🔁 /reboot - Перезагрузка системы"),
    command!("shutdown", Shutdown, Confirm, Some(Text::ShutdownConfirm), "⏹️ /shutdown - Shutdown system", "⏹️ /shutdown - Выключение системы"),
    command!("notify", Notify, Required, Some(Text::NotifyUsage), "🔔 /notify - Show notification", "🔔 /notify - Показать уведомление"),
    command!("volume", Volume, Required, Some(Text::VolumeUsage), "🔊 /volume - Volume control", "🔊 /volume - Управление громкостью"),
    command!("mkdir", Mkdir, Required, Some(Text::MkdirUsage), "📁 /mkdir - Create directory", "📁 /mkdir - Создать директорию"),
    command!("rm", Rm, Required, Some(Text::RmUsage), "🗑️ /rm - Remove file/dir", "🗑️ /rm - Удалить файл/директорию"),
    command!("lock", Lock, None, None, "🔒 /lock - Lock screen", "🔒 /lock - Заблокировать экран"),
    command!("uptime", Uptime, None, None, "⏱️ /uptime - Uptime and load", "⏱️ /uptime - Время работы и нагрузка"),
    command!("who", Who, None, None, "👥 /who - Logged-in users", "👥 /who - Вошедшие пользователи"),
    command!("top", Top, None, None, "🔥 /top - Top processes by CPU", "🔥 /top - Процессы по загрузке CPU"),
    command!("disks", Disks, None, None, "💾 /disks - Disk usage", "💾 /disks - Использование дисков"),
    command!("memory", Memory, None, None, "🧮 /memory - Memory usage", "🧮 /memory - Использование памяти"),
    command!("authlog", AuthLog, None, None, "📜 /authlog - Login history", "📜 /authlog - История входов"),
    command!("sessions", Sessions, None, None, "🖥️ /sessions - Wayland sessions", "🖥️ /sessions - Сессии Wayland"),
    command!("help", Help, None, None, "❓ /help - Show this message", "❓ /help - Показать это сообщение"),
];

/// Result of parsing one message text.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedInput {
    Command {
        spec: &'static CommandSpec,
        /// Inline argument, `None` when absent or blank
        argument: Option<String>,
    },
    /// Anything that is not a known command, including unknown `/tokens`
    Text(String),
}

impl PartialEq for CommandSpec {
    fn eq(&self, other: &Self) -> bool {
        self.token == other.token
    }
}

/// Stateless command parser for remote messages.
pub struct CommandRouter;

impl CommandRouter {
    /// Look up a command by token (without the leading `/`).
    pub fn lookup(token: &str) -> Option<&'static CommandSpec> {
        COMMANDS.iter().find(|spec| spec.token == token)
    }

    /// Look up the first command row for a kind.
    pub fn spec_for(kind: CommandKind) -> Option<&'static CommandSpec> {
        COMMANDS.iter().find(|spec| spec.kind == kind)
    }

    /// Parse message text.
    ///
    /// `/cmd args`, `/cmd@botname args` and bare `/cmd` are commands when the
    /// token is in [`COMMANDS`]; matching is case-sensitive.
    pub fn parse(text: &str) -> ParsedInput {
        let trimmed = text.trim();
        let Some(body) = trimmed.strip_prefix('/') else {
            return ParsedInput::Text(text.to_string());
        };

        let (head, rest) = match body.find(char::is_whitespace) {
            Some(pos) => (&body[..pos], body[pos..].trim()),
            None => (body, ""),
        };
        let token = head.split('@').next().unwrap_or(head);

        match Self::lookup(token) {
            Some(spec) => ParsedInput::Command {
                spec,
                argument: (!rest.is_empty()).then(|| rest.to_string()),
            },
            None => ParsedInput::Text(text.to_string()),
        }
    }

    /// Welcome message followed by the command list.
    pub fn help_text(lang: Language) -> String {
        let mut out = fill(text(lang, Text::Welcome), &[&env!("CARGO_PKG_VERSION")]);
        for spec in COMMANDS {
            out.push_str(spec.help(lang));
            out.push('\n');
        }
        out
    }
}
