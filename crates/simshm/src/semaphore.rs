use nix::errno::Errno;
use nix::libc;
use nix::sys::time::TimeSpec;
use nix::time::{ClockId, clock_gettime};
use std::ffi::CString;
use std::os::raw::c_int;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Longest single `sem_timedwait` call.
const MAX_WAIT_CHUNK: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Error, Debug)]
pub enum SemaphoreError {
    #[error("Failed to open semaphore: {0}")]
    OpenFailed(Errno),
    #[error("Invalid semaphore name")]
    InvalidName,
    #[error("Semaphore wait failed: {0}")]
    WaitFailed(Errno),
    #[error("Semaphore post failed: {0}")]
    PostFailed(Errno),
    #[error("Semaphore query failed: {0}")]
    QueryFailed(Errno),
}

/// A named POSIX semaphore handle. The handle is closed on drop; the name
/// itself stays in the namespace until someone unlinks it.
pub struct Semaphore {
    sem: *mut libc::sem_t,
    name: String,
}

impl Semaphore {
    /// Open `name`, creating it with `initial_value` if it does not exist yet.
    pub fn open_or_create(name: &str, initial_value: u32) -> Result<Self, SemaphoreError> {
        let c_name = CString::new(name).map_err(|_| SemaphoreError::InvalidName)?;

        let sem = unsafe {
            libc::sem_open(
                c_name.as_ptr(),
                libc::O_CREAT,
                0o666 as libc::mode_t,
                initial_value as libc::c_uint,
            )
        };

        if sem == libc::SEM_FAILED {
            return Err(SemaphoreError::OpenFailed(Errno::last()));
        }

        Ok(Self {
            sem,
            name: name.to_string(),
        })
    }

    /// Open an existing semaphore; fails with `ENOENT` if it does not exist.
    pub fn open(name: &str) -> Result<Self, SemaphoreError> {
        let c_name = CString::new(name).map_err(|_| SemaphoreError::InvalidName)?;

        let sem = unsafe { libc::sem_open(c_name.as_ptr(), 0) };

        if sem == libc::SEM_FAILED {
            return Err(SemaphoreError::OpenFailed(Errno::last()));
        }

        Ok(Self {
            sem,
            name: name.to_string(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn wait(&self) -> Result<(), SemaphoreError> {
        loop {
            let ret = unsafe { libc::sem_wait(self.sem) };
            if ret == 0 {
                return Ok(());
            }
            match Errno::last() {
                Errno::EINTR => continue,
                errno => return Err(SemaphoreError::WaitFailed(errno)),
            }
        }
    }

    pub fn try_wait(&self) -> Result<bool, SemaphoreError> {
        let ret = unsafe { libc::sem_trywait(self.sem) };
        if ret == 0 {
            Ok(true)
        } else {
            match Errno::last() {
                Errno::EAGAIN => Ok(false),
                errno => Err(SemaphoreError::WaitFailed(errno)),
            }
        }
    }

    /// Wait up to `timeout` for the semaphore. Returns `Ok(false)` on timeout.
    ///
    /// A zero timeout never blocks. A timeout too large to express as a
    /// deadline blocks until the semaphore is posted. Signal interruptions
    /// restart the wait with whatever time is left.
    pub fn timed_wait(&self, timeout: Duration) -> Result<bool, SemaphoreError> {
        if timeout.is_zero() {
            return self.try_wait();
        }

        let Some(deadline) = Instant::now().checked_add(timeout) else {
            self.wait()?;
            return Ok(true);
        };

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return self.try_wait();
            }

            // sem_timedwait takes an absolute CLOCK_REALTIME deadline; long
            // waits are split so the timespec arithmetic cannot overflow
            let chunk = remaining.min(MAX_WAIT_CHUNK);
            let now = clock_gettime(ClockId::CLOCK_REALTIME).map_err(SemaphoreError::WaitFailed)?;
            let abs_deadline = now + TimeSpec::from_duration(chunk);

            let ret = unsafe { libc::sem_timedwait(self.sem, abs_deadline.as_ref()) };
            if ret == 0 {
                return Ok(true);
            }
            match Errno::last() {
                Errno::ETIMEDOUT | Errno::EINTR => continue,
                errno => return Err(SemaphoreError::WaitFailed(errno)),
            }
        }
    }

    pub fn post(&self) -> Result<(), SemaphoreError> {
        let ret = unsafe { libc::sem_post(self.sem) };
        if ret != 0 {
            return Err(SemaphoreError::PostFailed(Errno::last()));
        }
        Ok(())
    }

    pub fn value(&self) -> Result<i32, SemaphoreError> {
        let mut val: c_int = 0;
        let ret = unsafe { libc::sem_getvalue(self.sem, &mut val) };
        if ret != 0 {
            return Err(SemaphoreError::QueryFailed(Errno::last()));
        }
        Ok(val)
    }

    pub fn unlink(name: &str) -> Result<(), SemaphoreError> {
        let c_name = CString::new(name).map_err(|_| SemaphoreError::InvalidName)?;
        let ret = unsafe { libc::sem_unlink(c_name.as_ptr()) };
        if ret != 0 {
            return Err(SemaphoreError::OpenFailed(Errno::last()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Semaphore").field("name", &self.name).finish()
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            libc::sem_close(self.sem);
        }
    }
}

unsafe impl Send for Semaphore {}
unsafe impl Sync for Semaphore {}

#[cfg(test)]
mod tests {
    use super::*;

    fn unique_name(tag: &str) -> String {
        format!("/simshm_test_{}_{}", tag, std::process::id())
    }

    #[test]
    fn test_post_then_try_wait() {
        let name = unique_name("post");
        let _ = Semaphore::unlink(&name);

        let sem = Semaphore::open_or_create(&name, 0).unwrap();
        assert!(!sem.try_wait().unwrap());

        sem.post().unwrap();
        assert_eq!(sem.value().unwrap(), 1);
        assert!(sem.try_wait().unwrap());
        assert_eq!(sem.value().unwrap(), 0);

        Semaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_timed_wait_times_out() {
        let name = unique_name("timeout");
        let _ = Semaphore::unlink(&name);

        let sem = Semaphore::open_or_create(&name, 0).unwrap();

        let start = Instant::now();
        assert!(!sem.timed_wait(Duration::from_millis(20)).unwrap());
        assert!(start.elapsed() >= Duration::from_millis(15));

        let start = Instant::now();
        assert!(!sem.timed_wait(Duration::ZERO).unwrap());
        assert!(start.elapsed() < Duration::from_millis(50));

        Semaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_timed_wait_wakes_on_post() {
        let name = unique_name("wake");
        let _ = Semaphore::unlink(&name);

        let sem = Semaphore::open_or_create(&name, 0).unwrap();
        let poster = Semaphore::open(&name).unwrap();

        let handle = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(10));
            poster.post().unwrap();
        });

        assert!(sem.timed_wait(Duration::from_secs(5)).unwrap());
        handle.join().unwrap();

        Semaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_unbounded_timeouts_return_pending_post() {
        let name = unique_name("unbounded");
        let _ = Semaphore::unlink(&name);

        let sem = Semaphore::open_or_create(&name, 0).unwrap();

        sem.post().unwrap();
        assert!(sem.timed_wait(Duration::MAX).unwrap());

        sem.post().unwrap();
        assert!(sem.timed_wait(Duration::from_secs(20_000_000_000)).unwrap());

        sem.post().unwrap();
        assert!(sem.timed_wait(MAX_WAIT_CHUNK * 3).unwrap());
        assert_eq!(sem.value().unwrap(), 0);

        Semaphore::unlink(&name).unwrap();
    }

    #[test]
    fn test_open_missing_fails() {
        let name = unique_name("missing");
        let _ = Semaphore::unlink(&name);

        match Semaphore::open(&name) {
            Err(SemaphoreError::OpenFailed(errno)) => assert_eq!(errno, Errno::ENOENT),
            other => panic!("expected ENOENT, got {other:?}"),
        }
    }

    #[test]
    fn test_interior_nul_is_invalid_name() {
        assert!(matches!(
            Semaphore::open_or_create("/bad\0name", 0),
            Err(SemaphoreError::InvalidName)
        ));
    }
}
