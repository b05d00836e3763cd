//! Account and stream key handlers.

use secrecy::ExposeSecret;
use serde::Serialize;

use snail_core::{AccountInfo, Session};

use crate::cli::{AccountArgs, AccountCommand, GlobalOpts};
use crate::commands::util;
use crate::config::{active_profile_name, load_config_or_default};
use crate::error::CliError;
use crate::output;

#[derive(Debug, Serialize)]
struct AccountView {
    name: String,
    stream_key: String,
}

impl AccountView {
    fn new(account: &AccountInfo, reveal: bool) -> Self {
        let key = account.stream_key.expose_secret();
        Self {
            name: account.name.clone(),
            stream_key: if reveal { key.to_owned() } else { util::mask(key) },
        }
    }
}

fn not_logged_in(global: &GlobalOpts) -> CliError {
    CliError::NotLoggedIn {
        profile: active_profile_name(global, &load_config_or_default()),
    }
}

fn show(account: &AccountInfo, reveal: bool, global: &GlobalOpts) {
    let view = AccountView::new(account, reveal);
    let out = output::render_single(
        &global.output,
        &view,
        |v| format!("Account:    {}\nStream key: {}", v.name, v.stream_key),
        |v| v.name.clone(),
    );
    output::print_output(&out, global.quiet);
}

pub async fn handle(session: &Session, args: AccountArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        AccountCommand::Show { reveal_key } => {
            let account = session.account().await.ok_or_else(|| not_logged_in(global))?;
            show(&account, reveal_key, global);
            Ok(())
        }

        AccountCommand::RegenerateKey => {
            if !util::confirm(
                "Regenerate the stream key? The current key stops working immediately.",
                "regenerate-key",
                global.yes,
            )? {
                return Ok(());
            }
            if !session.regenerate_stream_key().await {
                return Err(CliError::ApiError {
                    code: "refused".into(),
                    message: "the server did not issue a new stream key".into(),
                });
            }
            if !global.quiet {
                eprintln!("Stream key regenerated");
            }
            if let Some(account) = session.account().await {
                show(&account, false, global);
            }
            Ok(())
        }

        AccountCommand::Login => {
            session.login().await?;
            let account = session.account().await.ok_or_else(|| not_logged_in(global))?;
            show(&account, false, global);
            Ok(())
        }
    }
}
