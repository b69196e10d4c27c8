//! Application-wide constants
//!
//! Bus names, file locations and timer intervals used throughout the
//! application.

/// JACK D-Bus service addressing
pub mod jack {
    /// Well-known bus name of the JACK D-Bus service
    pub const SERVICE: &str = "org.jackaudio.service";

    /// Object path of the JACK controller
    pub const CONTROLLER_PATH: &str = "/org/jackaudio/Controller";
}

/// QjackCtl configuration file
pub mod qjackctl {
    /// Directory below the XDG config dir
    pub const APP_DIR: &str = "rncbc.org";

    /// Config file name
    pub const FILENAME: &str = "QjackCtl.conf";

    /// Section listing the preset names by ordinal
    pub const PRESETS_SECTION: &str = "Presets";

    /// Section holding `<preset>\<setting>` entries
    pub const SETTINGS_SECTION: &str = "Settings";

    /// Key in the presets section naming the default preset
    pub const DEFAULT_PRESET_KEY: &str = "DefPreset";

    /// Separator between preset name and setting name in settings keys
    pub const KEY_SEPARATOR: char = '\\';
}

/// Event loop timer intervals
pub mod intervals {
    /// Poll server statistics while it is running
    pub const GET_STATS_MS: u64 = 500;

    /// Check the QjackCtl config file for modifications
    pub const CHECK_CONF_MS: u64 = 1000;

    /// Delay between stopping the server and starting it again after a preset change
    pub const RESTART_MS: u64 = 1000;
}

/// Control socket for talking to a running instance
pub mod ipc {
    /// Directory below XDG_RUNTIME_DIR (or the cache dir)
    pub const SOCKET_DIR: &str = "jack-select";

    /// Socket file name
    pub const SOCKET_NAME: &str = "jack-select.sock";

    /// Maximum message size (64 KiB), requests and replies are tiny
    pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;
}
