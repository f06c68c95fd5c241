//! Operator-facing strings in English and Russian.
//!
//! Templates use `{}` placeholders filled positionally by [`fill`].

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ru,
}

impl Language {
    pub fn toggle(self) -> Self {
        match self {
            Language::En => Language::Ru,
            Language::Ru => Language::En,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Ru => "ru",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Message keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    Welcome,
    Started,
    Unauthorized,
    UnknownCommand,
    SystemInfo,
    Error,
    // prompts
    ShellUsage,
    SudoPassUsage,
    KillUsage,
    DownloadUsage,
    UploadUsage,
    CdUsage,
    HotkeyUsage,
    NotifyUsage,
    VolumeUsage,
    MkdirUsage,
    RmUsage,
    PlayUsage,
    RebootConfirm,
    ShutdownConfirm,
    // results
    SudoPassSet,
    SudoPassCleared,
    SudoPassRequired,
    FileSaved,
    FileNotFound,
    UploadReady,
    TransferFailed,
    CdSuccess,
    CdError,
    AlreadyAtRoot,
    DirectoryHeader,
    EmptyDirectory,
    ScreenshotSent,
    ScreenshotError,
    AudioPlaying,
    AudioError,
    AudioPaused,
    AudioResumed,
    AudioStopped,
    NoAudio,
    HotkeySent,
    HotkeyError,
    LanguageChanged,
    NotifySent,
    NotifyError,
    VolumeSet,
    VolumeError,
    MkdirSuccess,
    MkdirError,
    RmSuccess,
    RmError,
    LockSuccess,
    LockError,
    WallpaperSet,
    WallpaperError,
    PowerStarting,
    NoUsers,
    NoWaylandSessions,
    NoProcesses,
}

/// Template for `key` in `lang`.
pub fn text(lang: Language, key: Text) -> &'static str {
    match lang {
        Language::En => english(key),
        Language::Ru => russian(key),
    }
}

/// Substitute `{}` placeholders in order. Extra placeholders stay as-is.
pub fn fill(template: &str, args: &[&(dyn fmt::Display + Sync)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    let mut args = args.iter();
    while let Some(pos) = rest.find("{}") {
        match args.next() {
            Some(arg) => {
                out.push_str(&rest[..pos]);
                out.push_str(&arg.to_string());
                rest = &rest[pos + 2..];
            }
            None => break,
        }
    }
    out.push_str(rest);
    out
}

fn english(key: Text) -> &'static str {
    match key {
        Text::Welcome => "🎉 Welcome to Remote Assistant v{}!\n\n\
            Use the commands below. If a command needs an argument and none is given, \
            the next message is taken as the argument.\n\n\
            ✨ Available commands:\n",
        Text::Started => "🚀 Remote Assistant v{} started",
        Text::Unauthorized => "🚫 Access denied",
        Text::UnknownCommand => "❌ Unknown command. Use /help for list.",
        Text::SystemInfo => "🖥️ System Information\n\
            💻 PC Name: {}\n\
            👤 User: {}\n\
            🌐 IP: {}\n\
            🐧 OS: {}\n\
            ⚙️ Kernel: {}\n\
            🚀 Version: {}\n\
            🔐 Root: {}\n\
            📂 Current directory: {}\n\
            🧠 CPU: {} ({}%)\n\
            🧮 RAM: {}/{} GB ({}%)\n\
            💾 Disk: {}/{} GB ({}%)",
        Text::Error => "❌ Error: {}",
        Text::ShellUsage => "💻 Enter command to execute:",
        Text::SudoPassUsage => "🔐 Enter sudo password:",
        Text::KillUsage => "❌ Enter process name to kill:",
        Text::DownloadUsage => "📥 Enter file path to download:",
        Text::UploadUsage => "📤 Send a file to save it in the current directory, or /upload <dir> to choose another:",
        Text::CdUsage => "📁 Enter path to change directory:",
        Text::HotkeyUsage => "⌨️ Enter key combination (e.g.: ctrl+alt+t, or predefined: vol_up, vol_down, mute):",
        Text::NotifyUsage => "🔔 Enter notification text:",
        Text::VolumeUsage => "🔊 Enter action (up/down/set %):",
        Text::MkdirUsage => "📁 Enter new directory name:",
        Text::RmUsage => "🗑️ Enter path to remove:",
        Text::PlayUsage => "🎵 Reply to an audio message with /play",
        Text::RebootConfirm => "🔁 Confirm reboot: /reboot confirm",
        Text::ShutdownConfirm => "⏹️ Confirm shutdown: /shutdown confirm",
        Text::SudoPassSet => "✅ Sudo password set",
        Text::SudoPassCleared => "✅ Sudo password cleared",
        Text::SudoPassRequired => "🔐 Set sudo password first with /sudo_pass",
        Text::FileSaved => "✅ File saved: {}",
        Text::FileNotFound => "File not found",
        Text::UploadReady => "📤 Send the file, it will be saved to {}",
        Text::TransferFailed => "❌ Transfer failed: {}",
        Text::CdSuccess => "📂 Changed to: {}",
        Text::CdError => "❌ Error: {}",
        Text::AlreadyAtRoot => "Already at root",
        Text::DirectoryHeader => "📂 {}\n\n",
        Text::EmptyDirectory => "(empty)",
        Text::ScreenshotSent => "📸 Screenshot sent",
        Text::ScreenshotError => "❌ Screenshot error: {}",
        Text::AudioPlaying => "🔊 Playing audio: {}",
        Text::AudioError => "❌ Audio error: {}",
        Text::AudioPaused => "⏸️ Audio paused",
        Text::AudioResumed => "▶️ Audio resumed",
        Text::AudioStopped => "⏹️ Playback stopped",
        Text::NoAudio => "❌ No active playback",
        Text::HotkeySent => "⌨️ Combination sent: {}",
        Text::HotkeyError => "❌ Emulation error: {}",
        Text::LanguageChanged => "🌍 Language changed to: {}",
        Text::NotifySent => "🔔 Notification sent: {}",
        Text::NotifyError => "❌ Notification error: {}",
        Text::VolumeSet => "🔊 Volume: {}",
        Text::VolumeError => "❌ Volume error: {}",
        Text::MkdirSuccess => "✅ Directory created: {}",
        Text::MkdirError => "❌ Create error: {}",
        Text::RmSuccess => "✅ Removed: {}",
        Text::RmError => "❌ Remove error: {}",
        Text::LockSuccess => "🔒 Screen locked",
        Text::LockError => "❌ Lock error: {}",
        Text::WallpaperSet => "✅ Wallpaper set",
        Text::WallpaperError => "❌ Error setting wallpaper: {}",
        Text::PowerStarting => "⚡ Executing {}",
        Text::NoUsers => "No users logged in",
        Text::NoWaylandSessions => "No Wayland sessions found or only one authorization in Wayland history.",
        Text::NoProcesses => "No processes found",
    }
}

fn russian(key: Text) -> &'static str {
    match key {
        Text::Welcome => "🎉 Добро пожаловать в Remote Assistant v{}!\n\n\
            Используйте команды ниже. Если команда требует аргумента и он не указан, \
            следующее сообщение будет принято как аргумент.\n\n\
            ✨ Доступные команды:\n",
        Text::Started => "🚀 Remote Assistant v{} запущен",
        Text::Unauthorized => "🚫 Доступ запрещен",
        Text::UnknownCommand => "❌ Неизвестная команда. Используйте /help для списка.",
        Text::SystemInfo => "🖥️ Системная Информация\n\
            💻 Имя ПК: {}\n\
            👤 Пользователь: {}\n\
            🌐 IP: {}\n\
            🐧 ОС: {}\n\
            ⚙️ Ядро: {}\n\
            🚀 Версия: {}\n\
            🔐 Root: {}\n\
            📂 Текущая директория: {}\n\
            🧠 CPU: {} ({}%)\n\
            🧮 RAM: {}/{} GB ({}%)\n\
            💾 Диск: {}/{} GB ({}%)",
        Text::Error => "❌ Ошибка: {}",
        Text::ShellUsage => "💻 Введите команду для выполнения:",
        Text::SudoPassUsage => "🔐 Введите пароль для sudo:",
        Text::KillUsage => "❌ Введите имя процесса для завершения:",
        Text::DownloadUsage => "📥 Введите путь к файлу для скачивания:",
        Text::UploadUsage => "📤 Отправьте файл для сохранения в текущую директорию или /upload <dir> для выбора другой:",
        Text::CdUsage => "📁 Введите путь для смены директории:",
        Text::HotkeyUsage => "⌨️ Введите комбинацию клавиш (например: ctrl+alt+t, или предопределенные: vol_up, vol_down, mute):",
        Text::NotifyUsage => "🔔 Введите текст уведомления:",
        Text::VolumeUsage => "🔊 Введите действие (up/down/set %):",
        Text::MkdirUsage => "📁 Введите имя новой директории:",
        Text::RmUsage => "🗑️ Введите путь для удаления:",
        Text::PlayUsage => "🎵 Ответьте на аудиосообщение командой /play",
        Text::RebootConfirm => "🔁 Подтвердите перезагрузку: /reboot confirm",
        Text::ShutdownConfirm => "⏹️ Подтвердите выключение: /shutdown confirm",
        Text::SudoPassSet => "✅ Пароль sudo установлен",
        Text::SudoPassCleared => "✅ Пароль sudo очищен",
        Text::SudoPassRequired => "🔐 Сначала установите пароль sudo через /sudo_pass",
        Text::FileSaved => "✅ Файл сохранен: {}",
        Text::FileNotFound => "Файл не найден",
        Text::UploadReady => "📤 Отправьте файл, он будет сохранен в {}",
        Text::TransferFailed => "❌ Ошибка передачи: {}",
        Text::CdSuccess => "📂 Перешел в: {}",
        Text::CdError => "❌ Ошибка: {}",
        Text::AlreadyAtRoot => "Уже в корне",
        Text::DirectoryHeader => "📂 {}\n\n",
        Text::EmptyDirectory => "(пусто)",
        Text::ScreenshotSent => "📸 Скриншот отправлен",
        Text::ScreenshotError => "❌ Ошибка скриншота: {}",
        Text::AudioPlaying => "🔊 Воспроизведение аудио: {}",
        Text::AudioError => "❌ Ошибка аудио: {}",
        Text::AudioPaused => "⏸️ Аудио на паузе",
        Text::AudioResumed => "▶️ Аудио возобновлено",
        Text::AudioStopped => "⏹️ Воспроизведение остановлено",
        Text::NoAudio => "❌ Нет активного воспроизведения",
        Text::HotkeySent => "⌨️ Комбинация отправлена: {}",
        Text::HotkeyError => "❌ Ошибка эмуляции: {}",
        Text::LanguageChanged => "🌍 Язык изменен на: {}",
        Text::NotifySent => "🔔 Уведомление отправлено: {}",
        Text::NotifyError => "❌ Ошибка уведомления: {}",
        Text::VolumeSet => "🔊 Громкость: {}",
        Text::VolumeError => "❌ Ошибка громкости: {}",
        Text::MkdirSuccess => "✅ Директория создана: {}",
        Text::MkdirError => "❌ Ошибка создания: {}",
        Text::RmSuccess => "✅ Удалено: {}",
        Text::RmError => "❌ Ошибка удаления: {}",
        Text::LockSuccess => "🔒 Экран заблокирован",
        Text::LockError => "❌ Ошибка блокировки: {}",
        Text::WallpaperSet => "✅ Обои установлены",
        Text::WallpaperError => "❌ Ошибка установки обоев: {}",
        Text::PowerStarting => "⚡ Выполняется {}",
        Text::NoUsers => "Нет вошедших пользователей",
        Text::NoWaylandSessions => "Сессии Wayland не найдены или в истории Wayland только одна авторизация.",
        Text::NoProcesses => "Процессы не найдены",
    }
}
