use std::process::Command as ProcessCommand;

use anyhow::{Result, anyhow};

#[cfg(unix)]
use std::os::unix::process::CommandExt;

/// Terminal interrupts ignored for the life of a playback session.
#[cfg(unix)]
const SESSION_SIGNALS: [libc::c_int; 2] = [libc::SIGINT, libc::SIGQUIT];

/// Previous dispositions of [`SESSION_SIGNALS`], put back on drop.
#[cfg(unix)]
struct SessionSignals {
    saved: Vec<(libc::c_int, libc::sigaction)>,
}

#[cfg(unix)]
impl SessionSignals {
    fn ignore_all() -> Result<Self> {
        let mut guard = Self {
            saved: Vec::with_capacity(SESSION_SIGNALS.len()),
        };
        for signum in SESSION_SIGNALS {
            // On failure the guard drops here and restores what it already swapped.
            let previous = install_ignore(signum)?;
            guard.saved.push((signum, previous));
        }
        Ok(guard)
    }
}

#[cfg(unix)]
fn install_ignore(signum: libc::c_int) -> Result<libc::sigaction> {
    // SAFETY: both structs are plain C data fully initialised before use.
    unsafe {
        let mut ignore: libc::sigaction = std::mem::zeroed();
        ignore.sa_sigaction = libc::SIG_IGN;
        libc::sigemptyset(&mut ignore.sa_mask);

        let mut previous: libc::sigaction = std::mem::zeroed();
        if libc::sigaction(signum, &ignore, &mut previous) == 0 {
            Ok(previous)
        } else {
            let cause = std::io::Error::last_os_error();
            Err(anyhow!("cannot ignore signal {signum} during playback: {cause}"))
        }
    }
}

#[cfg(unix)]
impl Drop for SessionSignals {
    fn drop(&mut self) {
        for (signum, previous) in self.saved.drain(..).rev() {
            unsafe {
                libc::sigaction(signum, &previous, std::ptr::null_mut());
            }
        }
    }
}

/// Runs a playback session with SIGINT and SIGQUIT ignored so an interrupt
/// cannot skip recording what was watched.
#[cfg(unix)]
pub(crate) fn with_sigint_ignored<F, R>(session: F) -> Result<R>
where
    F: FnOnce() -> Result<R>,
{
    let signals = SessionSignals::ignore_all()?;
    let result = session();
    drop(signals);
    result
}

#[cfg(not(unix))]
pub(crate) fn with_sigint_ignored<F, R>(session: F) -> Result<R>
where
    F: FnOnce() -> Result<R>,
{
    session()
}

/// Children spawned while SIGINT is ignored would inherit that; give them
/// default handlers and their own process group instead.
#[cfg(unix)]
pub(super) fn restore_child_signals(cmd: &mut ProcessCommand) {
    unsafe {
        cmd.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
            libc::signal(libc::SIGQUIT, libc::SIG_DFL);
            if libc::setpgid(0, 0) != 0 {
                return Err(std::io::Error::last_os_error());
            }
            Ok(())
        });
    }
}

#[cfg(not(unix))]
pub(super) fn restore_child_signals(cmd: &mut ProcessCommand) {
    let _ = cmd;
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn current_handler(signum: libc::c_int) -> libc::sighandler_t {
        unsafe {
            let mut current: libc::sigaction = std::mem::zeroed();
            libc::sigaction(signum, std::ptr::null(), &mut current);
            current.sa_sigaction
        }
    }

    // One test only: dispositions are process-wide and tests run in parallel.
    #[test]
    fn session_signals_are_ignored_then_restored() {
        let before = (current_handler(libc::SIGINT), current_handler(libc::SIGQUIT));
        let inside = with_sigint_ignored(|| {
            Ok((current_handler(libc::SIGINT), current_handler(libc::SIGQUIT)))
        })
        .expect("session should run");
        assert_eq!(inside, (libc::SIG_IGN, libc::SIG_IGN));
        assert_eq!(
            (current_handler(libc::SIGINT), current_handler(libc::SIGQUIT)),
            before
        );

        let err = with_sigint_ignored::<_, ()>(|| Err(anyhow!("player crashed")))
            .expect_err("session error should surface");
        assert_eq!(err.to_string(), "player crashed");
        assert_eq!(
            (current_handler(libc::SIGINT), current_handler(libc::SIGQUIT)),
            before
        );
    }
}
