use std::fmt;

/// Declares a closed table of protocol codes.
///
/// Each row carries the numeric value, the short name used in zone files and
/// logs, and a human description. Lookups never fail loudly: an unknown value
/// or name gives `None`.
macro_rules! catalog {
    (
        $(#[$meta:meta])*
        pub enum $name:ident: $repr:ty {
            $( $variant:ident = $value:expr => ($title:expr, $desc:expr), )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr($repr)]
        pub enum $name {
            $( $variant = $value, )*
        }

        impl $name {
            const ALL: &'static [$name] = &[$( $name::$variant, )*];

            /// Looks up the entry with the given wire value
            pub fn from_value(value: $repr) -> Option<$name> {
                $name::ALL.iter().copied().find(|entry| entry.value() == value)
            }

            /// Looks up the entry by its short name, ignoring ASCII case
            pub fn from_name(name: &str) -> Option<$name> {
                $name::ALL
                    .iter()
                    .copied()
                    .find(|entry| entry.name().eq_ignore_ascii_case(name))
            }

            pub fn value(self) -> $repr {
                self as $repr
            }

            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $title, )*
                }
            }

            pub fn description(self) -> &'static str {
                match self {
                    $( $name::$variant => $desc, )*
                }
            }

            pub fn all() -> &'static [$name] {
                $name::ALL
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str(self.name())
            }
        }
    };
}

catalog! {
    /// The TYPE and QTYPE values of RFC 1035 section 3.2.2 and 3.2.3
    #[allow(clippy::upper_case_acronyms)]
    pub enum Type: u16 {
        A = 1 => ("A", "a host address"),
        NS = 2 => ("NS", "an authoritative name server"),
        MD = 3 => ("MD", "a mail destination (Obsolete - use MX)"),
        MF = 4 => ("MF", "a mail forwarder (Obsolete - use MX)"),
        CNAME = 5 => ("CNAME", "the canonical name for an alias"),
        SOA = 6 => ("SOA", "marks the start of a zone of authority"),
        MB = 7 => ("MB", "a mailbox domain name (EXPERIMENTAL)"),
        MG = 8 => ("MG", "a mail group member (EXPERIMENTAL)"),
        MR = 9 => ("MR", "a mail rename domain name (EXPERIMENTAL)"),
        NULL = 10 => ("NULL", "a null RR (EXPERIMENTAL)"),
        WKS = 11 => ("WKS", "a well known service description"),
        PTR = 12 => ("PTR", "a domain name pointer"),
        HINFO = 13 => ("HINFO", "host information"),
        MINFO = 14 => ("MINFO", "mailbox or mail list information"),
        MX = 15 => ("MX", "mail exchange"),
        TXT = 16 => ("TXT", "text strings"),
        AXFR = 252 => ("AXFR", "a request for a transfer of an entire zone"),
        MAILB = 253 => ("MAILB", "a request for mailbox-related records (MB, MG or MR)"),
        MAILA = 254 => ("MAILA", "a request for mail agent RRs (Obsolete - see MX)"),
        All = 255 => ("*", "a request for all records"),
    }
}

impl Type {
    /// QTYPE values may only appear in the question section
    pub fn is_query_only(self) -> bool {
        matches!(self, Type::AXFR | Type::MAILB | Type::MAILA | Type::All)
    }
}

catalog! {
    /// The CLASS and QCLASS values of RFC 1035 section 3.2.4 and 3.2.5
    #[allow(clippy::upper_case_acronyms)]
    pub enum Class: u16 {
        IN = 1 => ("IN", "the Internet"),
        CS = 2 => ("CS", "the CSNET class (Obsolete)"),
        CH = 3 => ("CH", "the CHAOS class"),
        HS = 4 => ("HS", "Hesiod [Dyer 87]"),
        Any = 255 => ("*", "any class"),
    }
}

impl Class {
    pub fn is_query_only(self) -> bool {
        self == Class::Any
    }
}

catalog! {
    /// The kind of query in the header, 4 bits on the wire
    pub enum Opcode: u8 {
        StandardQuery = 0 => ("QUERY", "a standard query"),
        InverseQuery = 1 => ("IQUERY", "an inverse query"),
        ServerStatus = 2 => ("STATUS", "a server status request"),
    }
}

catalog! {
    /// The response code in the header, 4 bits on the wire
    pub enum ResponseCode: u8 {
        NoError = 0 => ("Success", "no error condition"),
        FormatError = 1 => ("FormatError", "the name server was unable to interpret the query"),
        ServerFailure = 2 => (
            "ServerFailure",
            concat!(
                "the name server was unable to process this query ",
                "due to a problem with the name server"
            )
        ),
        NameError = 3 => ("NameError", "the domain name referenced in the query does not exist"),
        NotImplemented = 4 => (
            "NotImplemented",
            "the name server does not support the requested kind of query"
        ),
        Refused = 5 => (
            "Refused",
            "the name server refuses to perform the specified operation for policy reasons"
        ),
    }
}
