//! Actions the command table can bind to, and the state they act on.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use vtysh_grammar::Argv;
use vtysh_types::error::VtyshError;

use crate::session::Session;

/// Result of running an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Output to print, possibly empty.
    Success(String),
    /// The command ran but something needs the operator's attention.
    Warning(String),
}

impl Outcome {
    fn ok() -> Self {
        Outcome::Success(String::new())
    }
}

/// A named action from the `action` field of a `[[command]]` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ConfigureTerminal,
    Exit,
    End,
    Hostname,
    NoHostname,
    ShowVersion,
    ShowRunningConfig,
    List,
    Echo,
    Interface,
    IpRoute,
    Shutdown,
    NoShutdown,
    Description,
}

impl FromStr for Action {
    type Err = VtyshError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let action = match name {
            "configure-terminal" => Action::ConfigureTerminal,
            "exit" => Action::Exit,
            "end" => Action::End,
            "hostname" => Action::Hostname,
            "no-hostname" => Action::NoHostname,
            "show-version" => Action::ShowVersion,
            "show-running-config" => Action::ShowRunningConfig,
            "list" => Action::List,
            "echo" => Action::Echo,
            "interface" => Action::Interface,
            "ip-route" => Action::IpRoute,
            "shutdown" => Action::Shutdown,
            "no-shutdown" => Action::NoShutdown,
            "description" => Action::Description,
            other => return Err(VtyshError::Command(format!("unknown action: {other}"))),
        };
        Ok(action)
    }
}

impl Action {
    /// Run the action against the session with the matched arguments.
    pub fn run(self, session: &mut Session, argv: &Argv) -> Outcome {
        match self {
            Action::ConfigureTerminal => {
                session.enter_config();
                Outcome::ok()
            },
            Action::Exit => {
                session.exit_mode();
                Outcome::ok()
            },
            Action::End => {
                session.end();
                Outcome::ok()
            },
            Action::Hostname => match argv.get(0) {
                Some(name) => {
                    session.running().hostname = name.to_string();
                    Outcome::ok()
                },
                None => Outcome::Warning("hostname requires a name".into()),
            },
            Action::NoHostname => {
                let default = session.default_hostname().to_string();
                session.running().hostname = default;
                Outcome::ok()
            },
            Action::ShowVersion => {
                Outcome::Success(format!("vtysh demo shell {}", env!("CARGO_PKG_VERSION")))
            },
            Action::ShowRunningConfig => {
                let mut text = String::new();
                match session.registry().write_config(&mut text) {
                    Ok(()) => Outcome::Success(text.trim_end().to_string()),
                    Err(_) => Outcome::Warning("failed to render running configuration".into()),
                }
            },
            Action::List => {
                let formats = session.registry().list(session.mode());
                Outcome::Success(formats.iter().map(|f| format!("  {f}")).collect::<Vec<_>>().join("\n"))
            },
            Action::Echo => {
                let words: Vec<&str> = argv.iter().flatten().collect();
                Outcome::Success(words.join(" "))
            },
            Action::Interface => match argv.get(0) {
                Some(name) => {
                    session.running().interfaces.entry(name.to_string()).or_default();
                    session.enter_interface(name);
                    Outcome::ok()
                },
                None => Outcome::Warning("interface requires a name".into()),
            },
            Action::IpRoute => {
                let (Some(prefix), Some(nexthop)) = (argv.get(0), argv.get(1)) else {
                    return Outcome::Warning("ip route requires a prefix and a nexthop".into());
                };
                let route = StaticRoute {
                    prefix: prefix.to_string(),
                    nexthop: nexthop.to_string(),
                    distance: argv.get(2).map(str::to_string),
                };
                let mut running = session.running();
                if running.routes.contains(&route) {
                    return Outcome::Warning(format!("route {route} already configured"));
                }
                running.routes.push(route);
                Outcome::ok()
            },
            Action::Shutdown | Action::NoShutdown => {
                let down = self == Action::Shutdown;
                session.with_interface(|iface| iface.shutdown = down)
            },
            Action::Description => {
                let text: Vec<&str> = argv.iter().flatten().collect();
                let text = text.join(" ");
                session.with_interface(|iface| iface.description = Some(text))
            },
        }
    }
}

/// The configuration built up by the operator.
#[derive(Debug, Clone, Default)]
pub struct RunningConfig {
    pub hostname: String,
    pub interfaces: BTreeMap<String, InterfaceConfig>,
    pub routes: Vec<StaticRoute>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceConfig {
    pub description: Option<String>,
    pub shutdown: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticRoute {
    pub prefix: String,
    pub nexthop: String,
    pub distance: Option<String>,
}

impl fmt::Display for StaticRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.prefix, self.nexthop)?;
        if let Some(distance) = &self.distance {
            write!(f, " {distance}")?;
        }
        Ok(())
    }
}

impl RunningConfig {
    /// Global section: hostname and static routes.
    pub fn write_global(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        writeln!(out, "hostname {}", self.hostname)?;
        for route in &self.routes {
            writeln!(out, "ip route {route}")?;
        }
        writeln!(out, "!")
    }

    /// One block per configured interface.
    pub fn write_interfaces(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        for (name, iface) in &self.interfaces {
            writeln!(out, "interface {name}")?;
            if let Some(description) = &iface.description {
                writeln!(out, " description {description}")?;
            }
            if iface.shutdown {
                writeln!(out, " shutdown")?;
            }
            writeln!(out, "!")?;
        }
        Ok(())
    }
}
