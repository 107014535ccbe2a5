//! System link-control for the current network namespace
//!
//! Queries go through `if_indextoname(3)` and `SIOCGIF*` ioctls on a
//! datagram socket. The socket is created per call, so it always belongs to
//! the namespace the thread is in at that moment.
//!
//! Address, route and up/down changes need a netlink route socket, which this
//! backend does not speak; they report [`Error::Unsupported`].

#![allow(unsafe_code)]

use nix::sys::socket::{AddressFamily, SockFlag, SockType, socket};
use std::ffi::CStr;
use std::net::IpAddr;
use std::os::fd::{AsRawFd, OwnedFd};
use tracing::{debug, error};

use netdev_core::{Error, IfIndex, Result};

use crate::backend::{LinkControl, LinkState};

fn ifreq_for(dev_name: &str) -> Result<libc::ifreq> {
    let bytes = dev_name.as_bytes();
    if bytes.is_empty() || bytes.len() >= libc::IFNAMSIZ || bytes.contains(&0) {
        return Err(Error::LinkControl {
            operation: "ifreq".to_string(),
            message: format!("Invalid interface name '{dev_name}'"),
        });
    }

    // SAFETY: ifreq is plain old data; all-zero is a valid value.
    let mut ifr: libc::ifreq = unsafe { std::mem::zeroed() };
    for (dst, src) in ifr.ifr_name.iter_mut().zip(bytes) {
        *dst = *src as libc::c_char;
    }
    Ok(ifr)
}

/// Link-control talking to the kernel of the current namespace
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLinkControl;

impl SystemLinkControl {
    /// Create a new system link-control
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn control_socket(operation: &str) -> Result<OwnedFd> {
        socket(
            AddressFamily::Inet,
            SockType::Datagram,
            SockFlag::SOCK_CLOEXEC,
            None,
        )
        .map_err(|e| Error::LinkControl {
            operation: operation.to_string(),
            message: format!("Cannot create control socket: {e}"),
        })
    }

    fn ioctl(
        sock: &OwnedFd,
        request: libc::Ioctl,
        req: &mut libc::ifreq,
        operation: &str,
        dev_name: &str,
    ) -> Result<()> {
        // SAFETY: `req` is a properly sized, initialised `struct ifreq` that
        // outlives the call, and `sock` is an open socket.
        let ret = unsafe { libc::ioctl(sock.as_raw_fd(), request, std::ptr::from_mut(req)) };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            error!(dev = %dev_name, operation, error = %err, "ioctl failed");
            return Err(Error::LinkControl {
                operation: operation.to_string(),
                message: format!("{dev_name}: {err}"),
            });
        }
        Ok(())
    }

    fn unsupported(operation: &str, dev_name: &str) -> Error {
        error!(
            dev = %dev_name,
            operation,
            "Not supported without a netlink route backend"
        );
        Error::Unsupported {
            operation: operation.to_string(),
        }
    }
}

impl LinkControl for SystemLinkControl {
    fn resolve_name(&self, ifindex: IfIndex) -> Result<String> {
        let mut buf = [0 as libc::c_char; libc::IF_NAMESIZE];

        // SAFETY: `buf` holds IF_NAMESIZE bytes as if_indextoname requires.
        let ret = unsafe { libc::if_indextoname(ifindex.as_raw(), buf.as_mut_ptr()) };
        if ret.is_null() {
            debug!(
                ifindex = ifindex.as_raw(),
                error = %std::io::Error::last_os_error(),
                "if_indextoname failed"
            );
            return Err(Error::NoSuchDevice {
                ifindex: ifindex.as_raw(),
            });
        }

        // SAFETY: on success the buffer holds a NUL-terminated name.
        let name = unsafe { CStr::from_ptr(buf.as_ptr()) };
        Ok(name.to_string_lossy().into_owned())
    }

    fn link_state(&self, dev_name: &str) -> Result<LinkState> {
        let sock = Self::control_socket("link_state")?;

        let mut req = ifreq_for(dev_name)?;
        Self::ioctl(&sock, libc::SIOCGIFFLAGS, &mut req, "SIOCGIFFLAGS", dev_name)?;
        // SAFETY: SIOCGIFFLAGS filled the flags member.
        let flags = unsafe { req.ifr_ifru.ifru_flags };

        let mut req = ifreq_for(dev_name)?;
        Self::ioctl(&sock, libc::SIOCGIFMTU, &mut req, "SIOCGIFMTU", dev_name)?;
        // SAFETY: SIOCGIFMTU filled the mtu member.
        let mtu = unsafe { req.ifr_ifru.ifru_mtu };

        Ok(LinkState {
            up: i32::from(flags) & libc::IFF_UP != 0,
            mtu: u32::try_from(mtu).unwrap_or_default(),
        })
    }

    fn set_up(&self, dev_name: &str, _up: bool) -> Result<()> {
        Err(Self::unsupported("set_up", dev_name))
    }

    fn add_address(&self, dev_name: &str, _addr: IpAddr, _prefix_len: u8) -> Result<()> {
        Err(Self::unsupported("add_address", dev_name))
    }

    fn add_route(
        &self,
        dev_name: &str,
        _dst: IpAddr,
        _prefix_len: u8,
        _gateway: Option<IpAddr>,
    ) -> Result<()> {
        Err(Self::unsupported("add_route", dev_name))
    }
}
