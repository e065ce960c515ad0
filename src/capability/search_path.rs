use std::ffi::{CStr, OsStr, OsString};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

const USER_DIR: &str = ".terminfo";
const SYSTEM_DIRS: [&str; 3] = ["/etc/terminfo", "/lib/terminfo", "/usr/share/terminfo"];

/// Snapshot of the environment variables that drive terminfo lookup.
///
/// Taken once at startup so resolution never races with the process
/// environment and tests can describe any layout without `set_var`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TerminfoEnv {
    pub term: Option<OsString>,
    pub terminfo: Option<OsString>,
    pub home: Option<OsString>,
    pub terminfo_dirs: Option<OsString>,
}

impl TerminfoEnv {
    /// Reads the process environment. An unset or empty `HOME` falls back to
    /// the user's passwd entry.
    pub fn from_process() -> Self {
        Self {
            term: std::env::var_os("TERM"),
            terminfo: std::env::var_os("TERMINFO"),
            home: home_dir(std::env::var_os("HOME")),
            terminfo_dirs: std::env::var_os("TERMINFO_DIRS"),
        }
    }

    /// Terminal type name; empty when `TERM` is unset.
    pub fn term_name(&self) -> String {
        self.term
            .as_ref()
            .map(|t| t.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    fn non_empty(value: &Option<OsString>) -> Option<&OsString> {
        value.as_ref().filter(|v| !v.is_empty())
    }
}

/// `$HOME` when set and non-empty, otherwise the passwd entry of the
/// current user.
fn home_dir(env_home: Option<OsString>) -> Option<OsString> {
    match env_home {
        Some(home) if !home.is_empty() => Some(home),
        _ => passwd_home(),
    }
}

fn passwd_home() -> Option<OsString> {
    let mut buf = vec![0 as libc::c_char; 1024];
    loop {
        // SAFETY: passwd is plain old data; getpwuid_r fills it with pointers
        // into `buf`, which outlives every read below.
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        let rc = unsafe {
            libc::getpwuid_r(
                libc::getuid(),
                &mut pwd,
                buf.as_mut_ptr(),
                buf.len(),
                &mut result,
            )
        };
        if rc == libc::ERANGE && buf.len() < 1 << 20 {
            buf.resize(buf.len() * 2, 0);
            continue;
        }
        if rc != 0 || result.is_null() || pwd.pw_dir.is_null() {
            tracing::debug!(rc, "no passwd entry for current user");
            return None;
        }
        // SAFETY: pw_dir is a NUL-terminated string inside `buf`.
        let dir = unsafe { CStr::from_ptr(pwd.pw_dir) }.to_bytes();
        if dir.is_empty() {
            return None;
        }
        return Some(OsStr::from_bytes(dir).to_os_string());
    }
}

/// Ordered list of directories searched for a terminfo entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPath {
    dirs: Vec<PathBuf>,
}

impl SearchPath {
    /// Builds the path in priority order: `$TERMINFO`, `$HOME/.terminfo`,
    /// `$TERMINFO_DIRS`, then the system directories.
    ///
    /// Returns `None` when the home directory cannot be determined; see
    /// [`TerminfoEnv::from_process`] for the passwd fallback.
    pub fn from_env(env: &TerminfoEnv) -> Option<Self> {
        let mut dirs = Vec::new();

        if let Some(dir) = TerminfoEnv::non_empty(&env.terminfo) {
            dirs.push(PathBuf::from(dir));
        }

        let home = TerminfoEnv::non_empty(&env.home)?;
        dirs.push(Path::new(home).join(USER_DIR));

        if let Some(list) = TerminfoEnv::non_empty(&env.terminfo_dirs) {
            dirs.extend(
                list.as_bytes()
                    .split(|b| *b == b':')
                    .map(|entry| PathBuf::from(OsStr::from_bytes(entry))),
            );
        }

        dirs.extend(SYSTEM_DIRS.iter().map(PathBuf::from));
        Some(Self { dirs })
    }

    pub fn from_dirs<I, P>(dirs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            dirs: dirs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }

    pub fn into_dirs(self) -> Vec<PathBuf> {
        self.dirs
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capability/search_path.rs"]
mod tests;
