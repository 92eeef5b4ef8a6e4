//! Menu types

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliResponse {
    Continue,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Status,
    Networks,
    SwitchChain,
    TokenBalance,
    TokenInfo,
    Disconnect,
    Exit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 7] = [
        MenuChoice::Status,
        MenuChoice::Networks,
        MenuChoice::SwitchChain,
        MenuChoice::TokenBalance,
        MenuChoice::TokenInfo,
        MenuChoice::Disconnect,
        MenuChoice::Exit,
    ];

    pub fn key(self) -> &'static str {
        match self {
            MenuChoice::Status => "1",
            MenuChoice::Networks => "2",
            MenuChoice::SwitchChain => "3",
            MenuChoice::TokenBalance => "4",
            MenuChoice::TokenInfo => "5",
            MenuChoice::Disconnect => "6",
            MenuChoice::Exit => "0",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MenuChoice::Status => "Connection status",
            MenuChoice::Networks => "Supported networks",
            MenuChoice::SwitchChain => "Switch chain",
            MenuChoice::TokenBalance => "ERC-20 balance",
            MenuChoice::TokenInfo => "ERC-20 token info",
            MenuChoice::Disconnect => "Disconnect",
            MenuChoice::Exit => "Exit",
        }
    }
}

impl FromStr for MenuChoice {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        MenuChoice::ALL
            .into_iter()
            .find(|choice| choice.key() == s)
            .or(match s.as_str() {
                "status" => Some(MenuChoice::Status),
                "networks" => Some(MenuChoice::Networks),
                "switch" => Some(MenuChoice::SwitchChain),
                "balance" => Some(MenuChoice::TokenBalance),
                "token" => Some(MenuChoice::TokenInfo),
                "disconnect" => Some(MenuChoice::Disconnect),
                "exit" | "quit" | "q" => Some(MenuChoice::Exit),
                _ => None,
            })
            .ok_or_else(|| format!("unknown choice {s:?}"))
    }
}
