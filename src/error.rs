use std::{error::Error, fmt, io};

/// Infrastructure failures. Any of these aborts the run.
#[derive(Debug)]
pub enum ProbeError {
    SocketCreation(io::Error),
    Bind(io::Error),
    SetOption(io::Error),
    Send(io::Error),
    Wait(io::Error),
    Receive(io::Error),
    Codec(bincode::Error),
    MalformedReply { len: usize },
}

impl fmt::Display for ProbeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeError::SocketCreation(e) => write!(f, "Socket Creation Failed: {}", e),
            ProbeError::Bind(e) => write!(f, "Socket Bind Failed: {}", e),
            ProbeError::SetOption(e) => write!(f, "Setting Socket Option Failed: {}", e),
            ProbeError::Send(e) => write!(f, "Send To Failed: {}", e),
            ProbeError::Wait(e) => write!(f, "Waiting For Reply Failed: {}", e),
            ProbeError::Receive(e) => write!(f, "Receive From Failed: {}", e),
            ProbeError::Codec(e) => write!(f, "Packet Encoding Failed: {}", e),
            ProbeError::MalformedReply { len } => {
                write!(f, "Malformed Reply: {} bytes is too short for IP + ICMP headers", len)
            }
        }
    }
}

impl Error for ProbeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ProbeError::SocketCreation(e)
            | ProbeError::Bind(e)
            | ProbeError::SetOption(e)
            | ProbeError::Send(e)
            | ProbeError::Wait(e)
            | ProbeError::Receive(e) => Some(e),
            ProbeError::Codec(e) => Some(e),
            ProbeError::MalformedReply { .. } => None,
        }
    }
}

impl From<bincode::Error> for ProbeError {
    fn from(error: bincode::Error) -> ProbeError {
        ProbeError::Codec(error)
    }
}

#[cfg(test)]
mod tests {
    use std::io::ErrorKind;

    use super::*;

    #[test]
    fn fmt_names_the_failed_stage() {
        let error = ProbeError::Send(io::Error::new(ErrorKind::Other, "network is down"));
        assert_eq!("Send To Failed: network is down", format!("{}", error));

        let error = ProbeError::MalformedReply { len: 12 };
        assert_eq!(
            "Malformed Reply: 12 bytes is too short for IP + ICMP headers",
            error.to_string()
        );
    }

    #[test]
    fn source_is_the_io_error() {
        let error = ProbeError::Wait(io::Error::from(ErrorKind::Interrupted));
        let source = error.source().unwrap();
        assert_eq!(
            ErrorKind::Interrupted,
            source.downcast_ref::<io::Error>().unwrap().kind()
        );
        assert!(ProbeError::MalformedReply { len: 0 }.source().is_none());
    }

    #[test]
    fn from_bincode_error() {
        let bincode_error: bincode::Error = Box::new(bincode::ErrorKind::SizeLimit);
        let error: ProbeError = bincode_error.into();
        assert!(matches!(error, ProbeError::Codec(_)));
    }
}
