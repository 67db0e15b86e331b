use super::bus::{BusError, RegisterBus};
use std::ffi::CString;

/// [`RegisterBus`] over a Linux i2c-dev character device.
#[derive(Debug)]
pub struct LinuxI2cBus {
    fd: libc::c_int,
}

impl LinuxI2cBus {
    /// `I2C_SLAVE` request from `linux/i2c-dev.h`.
    const I2C_SLAVE: libc::c_ulong = 0x0703;
    /// Default slave address of the motion sensor (AD0 low).
    pub const IMU_ADDRESS: u16 = 0x68;

    /// Opens `path` and binds the descriptor to slave `address`.
    ///
    /// # Errors
    /// - [`BusError::Io`] with the errno of the failing `open` or `ioctl`.
    pub fn open(path: &str, address: u16) -> Result<Self, BusError> {
        let c_path = CString::new(path).map_err(|_| BusError::Io(libc::EINVAL))?;
        // SAFETY: `c_path` is a valid NUL-terminated string for the duration of the call.
        let fd = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR) };
        if fd < 0 {
            return Err(last_os_error());
        }
        let bus = Self { fd };
        // SAFETY: `fd` is an open descriptor owned by `bus`.
        if unsafe { libc::ioctl(bus.fd, Self::I2C_SLAVE as _, libc::c_ulong::from(address)) } < 0 {
            return Err(last_os_error());
        }
        Ok(bus)
    }

    fn write_all(&mut self, frame: &[u8]) -> Result<(), BusError> {
        // SAFETY: `frame` is valid for `frame.len()` bytes.
        let n = unsafe { libc::write(self.fd, frame.as_ptr().cast(), frame.len()) };
        match usize::try_from(n) {
            Ok(written) if written == frame.len() => Ok(()),
            Ok(_) => Err(BusError::Io(libc::EIO)),
            Err(_) => Err(last_os_error()),
        }
    }
}

impl RegisterBus for LinuxI2cBus {
    fn read(&mut self, reg: u8, buf: &mut [u8]) -> Result<(), BusError> {
        self.write_all(&[reg])?;
        // SAFETY: `buf` is valid for writes of `buf.len()` bytes.
        let n = unsafe { libc::read(self.fd, buf.as_mut_ptr().cast(), buf.len()) };
        match usize::try_from(n) {
            Ok(read) if read == buf.len() => Ok(()),
            Ok(_) => Err(BusError::Io(libc::EIO)),
            Err(_) => Err(last_os_error()),
        }
    }

    fn write(&mut self, reg: u8, buf: &[u8]) -> Result<(), BusError> {
        let mut frame = Vec::with_capacity(buf.len() + 1);
        frame.push(reg);
        frame.extend_from_slice(buf);
        self.write_all(&frame)
    }
}

impl Drop for LinuxI2cBus {
    fn drop(&mut self) {
        // SAFETY: `fd` was opened by `open` and is closed exactly once.
        unsafe { libc::close(self.fd) };
    }
}

fn last_os_error() -> BusError {
    BusError::Io(std::io::Error::last_os_error().raw_os_error().unwrap_or(libc::EIO))
}
