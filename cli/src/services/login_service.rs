//! Login service - exchanges credentials for a token and picks an organisation

use std::io::{BufRead, Write};
use std::sync::Arc;

use tracing::{debug, info};

use crate::domain::remote::{Login, Organisation};
use crate::error::LoginError;
use crate::infrastructure::{CredentialStore, RemoteGateway};
use crate::ui;

/// Organisation prompts answered before login gives up
pub const MAX_SELECTION_ATTEMPTS: u32 = 5;

pub struct LoginService {
    gateway: Arc<dyn RemoteGateway>,
    credentials: Arc<dyn CredentialStore>,
}

impl LoginService {
    pub fn new(gateway: Arc<dyn RemoteGateway>, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            gateway,
            credentials,
        }
    }

    /// Log in and store the token and the selected organisation.
    ///
    /// With several organisations the user is asked to choose one through
    /// `input`/`output`. Returns the selected organisation.
    pub async fn login<R, W>(
        &self,
        email: &str,
        password: &str,
        input: &mut R,
        output: &mut W,
    ) -> Result<Organisation, LoginError>
    where
        R: BufRead,
        W: Write,
    {
        let request = Login {
            email: email.to_string(),
            password: password.to_string(),
        };
        let token = self
            .gateway
            .login(&request)
            .await
            .map_err(|source| LoginError::Remote {
                stage: "login",
                source,
            })?;
        self.credentials.save_token(&token.value)?;
        debug!("token saved");

        let user = self
            .gateway
            .get_user()
            .await
            .map_err(|source| LoginError::Remote {
                stage: "user lookup",
                source,
            })?;
        debug!("logged in as {} ({})", user.email, user.id);

        let organisation = select_organisation(user.organisations, input, output)?;
        self.credentials.save_organisation(&organisation.id)?;

        info!("login successful");
        Ok(organisation)
    }
}

/// Pick the organisation to act for. A single organisation is taken as is.
fn select_organisation<R, W>(
    mut organisations: Vec<Organisation>,
    input: &mut R,
    output: &mut W,
) -> Result<Organisation, LoginError>
where
    R: BufRead,
    W: Write,
{
    match organisations.len() {
        0 => return Err(LoginError::NoOrganisation),
        1 => return Ok(organisations.remove(0)),
        _ => {}
    }

    ui::organisation_menu(output, &organisations)?;

    for _ in 0..MAX_SELECTION_ATTEMPTS {
        ui::selection_prompt(output)?;

        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            return Err(LoginError::InputClosed);
        }

        match parse_choice(&line, organisations.len()) {
            Some(index) => return Ok(organisations.swap_remove(index)),
            None => ui::invalid_choice(output)?,
        }
    }

    Err(LoginError::TooManyAttempts(MAX_SELECTION_ATTEMPTS))
}

/// 1-based menu choice to index
fn parse_choice(line: &str, len: usize) -> Option<usize> {
    match line.trim().parse::<usize>() {
        Ok(choice) if (1..=len).contains(&choice) => Some(choice - 1),
        _ => None,
    }
}
