use redis_protocol::resp2::types::OwnedFrame as Frame;

/// Remote set commands issued by the algebra engine and the façade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Adds the specified members to the set stored at key.
    SAdd { key: String, members: Vec<Vec<u8>> },
    /// Removes the specified members from the set stored at key.
    SRem { key: String, members: Vec<Vec<u8>> },
    /// Returns if member is a member of the set stored at key.
    SIsMember { key: String, member: Vec<u8> },
    /// Returns the cardinality of the set stored at key.
    SCard { key: String },
    /// Returns all the members of the set value stored at key.
    SMembers { key: String },
    /// Returns the members of the union of all the given sets.
    SUnion { keys: Vec<String> },
    /// Returns the members of the intersection of all the given sets.
    SInter { keys: Vec<String> },
    /// Returns the members of the first set minus all the successive sets.
    SDiff { keys: Vec<String> },
    SUnionStore { destination: String, keys: Vec<String> },
    SInterStore { destination: String, keys: Vec<String> },
    SDiffStore { destination: String, keys: Vec<String> },
    /// Returns a random member without removing it.
    SRandMember { key: String },
    /// Removes and returns a random member.
    SPop { key: String },
    Del { keys: Vec<String> },
    Type { key: String },
    Rename { key: String, new_key: String },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SAdd { .. } => "SADD",
            Command::SRem { .. } => "SREM",
            Command::SIsMember { .. } => "SISMEMBER",
            Command::SCard { .. } => "SCARD",
            Command::SMembers { .. } => "SMEMBERS",
            Command::SUnion { .. } => "SUNION",
            Command::SInter { .. } => "SINTER",
            Command::SDiff { .. } => "SDIFF",
            Command::SUnionStore { .. } => "SUNIONSTORE",
            Command::SInterStore { .. } => "SINTERSTORE",
            Command::SDiffStore { .. } => "SDIFFSTORE",
            Command::SRandMember { .. } => "SRANDMEMBER",
            Command::SPop { .. } => "SPOP",
            Command::Del { .. } => "DEL",
            Command::Type { .. } => "TYPE",
            Command::Rename { .. } => "RENAME",
        }
    }

    /// The key an error reply is attributed to.
    pub fn key(&self) -> &str {
        match self {
            Command::SAdd { key, .. }
            | Command::SRem { key, .. }
            | Command::SIsMember { key, .. }
            | Command::SCard { key }
            | Command::SMembers { key }
            | Command::SRandMember { key }
            | Command::SPop { key }
            | Command::Type { key }
            | Command::Rename { key, .. } => key,
            Command::SUnionStore { destination, .. }
            | Command::SInterStore { destination, .. }
            | Command::SDiffStore { destination, .. } => destination,
            Command::SUnion { keys } | Command::SInter { keys } | Command::SDiff { keys } | Command::Del { keys } => {
                keys.first().map(String::as_str).unwrap_or("")
            }
        }
    }

    fn args(&self) -> Vec<Vec<u8>> {
        fn keys_of(keys: &[String]) -> impl Iterator<Item = Vec<u8>> + '_ {
            keys.iter().map(|k| k.as_bytes().to_vec())
        }

        match self {
            Command::SAdd { key, members } | Command::SRem { key, members } => {
                std::iter::once(key.as_bytes().to_vec()).chain(members.iter().cloned()).collect()
            }
            Command::SIsMember { key, member } => vec![key.as_bytes().to_vec(), member.clone()],
            Command::SCard { key }
            | Command::SMembers { key }
            | Command::SRandMember { key }
            | Command::SPop { key }
            | Command::Type { key } => vec![key.as_bytes().to_vec()],
            Command::SUnion { keys } | Command::SInter { keys } | Command::SDiff { keys } | Command::Del { keys } => {
                keys_of(keys).collect()
            }
            Command::SUnionStore { destination, keys }
            | Command::SInterStore { destination, keys }
            | Command::SDiffStore { destination, keys } => std::iter::once(destination.as_bytes().to_vec())
                .chain(keys_of(keys))
                .collect(),
            Command::Rename { key, new_key } => vec![key.as_bytes().to_vec(), new_key.as_bytes().to_vec()],
        }
    }

    /// RESP2 request: an array of bulk strings, command name first.
    pub fn to_frame(&self) -> Frame {
        let args = self.args();
        let mut parts = Vec::with_capacity(1 + args.len());
        parts.push(Frame::BulkString(self.name().as_bytes().to_vec()));
        parts.extend(args.into_iter().map(Frame::BulkString));
        Frame::Array(parts)
    }

    /// Parses a RESP2 request array back into a command.
    pub fn from_frame(frame: &Frame) -> Result<Command, String> {
        match frame {
            Frame::Array(arr) if !arr.is_empty() => {
                let parts: Vec<&[u8]> = arr
                    .iter()
                    .filter_map(|f| match f {
                        Frame::BulkString(arg) => Some(arg.as_slice()),
                        Frame::SimpleString(arg) => Some(arg.as_slice()),
                        _ => None,
                    })
                    .collect();
                if parts.len() != arr.len() {
                    return Err("ERR invalid command".into());
                }
                let name = std::str::from_utf8(parts[0]).unwrap_or("");
                Command::parse(name, &parts[1..])
            }
            _ => Err("ERR invalid command".into()),
        }
    }

    pub fn parse(name: &str, args: &[&[u8]]) -> Result<Command, String> {
        let upper = name.to_ascii_uppercase();
        let arity = |min: usize, exact: bool| -> Result<(), String> {
            if args.len() < min || (exact && args.len() != min) {
                Err(format!("ERR wrong number of arguments for '{}' command", name.to_ascii_lowercase()))
            } else {
                Ok(())
            }
        };
        let key = |i: usize| -> Result<String, String> {
            std::str::from_utf8(args[i])
                .map(str::to_string)
                .map_err(|_| "ERR invalid key".to_string())
        };
        let keys = |from: usize| -> Result<Vec<String>, String> { (from..args.len()).map(key).collect() };
        let members = || args[1..].iter().map(|m| m.to_vec()).collect::<Vec<_>>();

        let command = match upper.as_str() {
            "SADD" => {
                arity(2, false)?;
                Command::SAdd { key: key(0)?, members: members() }
            }
            "SREM" => {
                arity(2, false)?;
                Command::SRem { key: key(0)?, members: members() }
            }
            "SISMEMBER" => {
                arity(2, true)?;
                Command::SIsMember { key: key(0)?, member: args[1].to_vec() }
            }
            "SCARD" => {
                arity(1, true)?;
                Command::SCard { key: key(0)? }
            }
            "SMEMBERS" => {
                arity(1, true)?;
                Command::SMembers { key: key(0)? }
            }
            "SUNION" => {
                arity(1, false)?;
                Command::SUnion { keys: keys(0)? }
            }
            "SINTER" => {
                arity(1, false)?;
                Command::SInter { keys: keys(0)? }
            }
            "SDIFF" => {
                arity(1, false)?;
                Command::SDiff { keys: keys(0)? }
            }
            "SUNIONSTORE" => {
                arity(2, false)?;
                Command::SUnionStore { destination: key(0)?, keys: keys(1)? }
            }
            "SINTERSTORE" => {
                arity(2, false)?;
                Command::SInterStore { destination: key(0)?, keys: keys(1)? }
            }
            "SDIFFSTORE" => {
                arity(2, false)?;
                Command::SDiffStore { destination: key(0)?, keys: keys(1)? }
            }
            "SRANDMEMBER" => {
                arity(1, true)?;
                Command::SRandMember { key: key(0)? }
            }
            "SPOP" => {
                arity(1, true)?;
                Command::SPop { key: key(0)? }
            }
            "DEL" => {
                arity(1, false)?;
                Command::Del { keys: keys(0)? }
            }
            "TYPE" => {
                arity(1, true)?;
                Command::Type { key: key(0)? }
            }
            "RENAME" => {
                arity(2, true)?;
                Command::Rename { key: key(0)?, new_key: key(1)? }
            }
            _ => {
                let args_str: String = args
                    .iter()
                    .filter_map(|s| std::str::from_utf8(s).ok())
                    .collect::<Vec<&str>>()
                    .join(" ");
                return Err(format!(
                    "ERR unknown command '{}', with args beginning with: '{}'",
                    name, args_str
                ));
            }
        };
        Ok(command)
    }
}
