/// A text frame translated into a hub operation.
///
/// Frames use the colon separated form `kind:arg1[:arg2]`. The last argument
/// keeps any further colons as part of the payload.
#[derive(Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// `broadcast:<payload>` to every connection except the sender
    Broadcast { payload: &'a str },
    /// `group:<name>:<payload>` to the named group except the sender
    Group { group: &'a str, payload: &'a str },
    /// `to:<connection id>:<payload>` to a single connection
    To { target: &'a str, payload: &'a str },
    /// Any other kind: the whole frame goes to the sender's group, or everyone
    Relay { payload: &'a str },
}

impl<'a> Command<'a> {
    /// Returns `None` for frames that are silently ignored: anything without a
    /// colon, and `group`/`to` frames missing their payload.
    pub fn parse(text: &'a str) -> Option<Self> {
        let (kind, rest) = text.split_once(':')?;

        match kind {
            "broadcast" => Some(Command::Broadcast { payload: rest }),
            "group" => rest
                .split_once(':')
                .map(|(group, payload)| Command::Group { group, payload }),
            "to" => rest
                .split_once(':')
                .map(|(target, payload)| Command::To { target, payload }),
            _ => Some(Command::Relay { payload: text }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_direct_send() {
        assert_eq!(
            Command::parse("to:B:hello"),
            Some(Command::To {
                target: "B",
                payload: "hello"
            })
        );
    }

    #[test]
    fn parses_group_broadcast() {
        assert_eq!(
            Command::parse("group:room1:hi"),
            Some(Command::Group {
                group: "room1",
                payload: "hi"
            })
        );
    }

    #[test]
    fn last_argument_keeps_its_colons() {
        assert_eq!(
            Command::parse("to:B:12:30 works?"),
            Some(Command::To {
                target: "B",
                payload: "12:30 works?"
            })
        );
        assert_eq!(
            Command::parse("broadcast:a:b"),
            Some(Command::Broadcast { payload: "a:b" })
        );
    }

    #[test]
    fn frame_without_colon_is_ignored() {
        assert_eq!(Command::parse("hello"), None);
        assert_eq!(Command::parse(""), None);
    }

    #[test]
    fn group_and_to_without_payload_are_ignored() {
        assert_eq!(Command::parse("group:room1"), None);
        assert_eq!(Command::parse("to:B"), None);
    }

    #[test]
    fn unknown_kind_relays_whole_frame() {
        assert_eq!(
            Command::parse("chat:hello there"),
            Some(Command::Relay {
                payload: "chat:hello there"
            })
        );
    }

    #[test]
    fn empty_broadcast_payload_is_allowed() {
        assert_eq!(
            Command::parse("broadcast:"),
            Some(Command::Broadcast { payload: "" })
        );
    }
}
