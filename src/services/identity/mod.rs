use serde::Serialize;

use crate::{
    error::AppResult,
    models::{Account, User, Watcher},
    services::watchers::WatcherService,
};

pub mod accounts;
pub mod password;
pub mod users;

pub use accounts::AccountService;
pub use users::UserService;

/// Random single-use token for activation codes and account join tokens
pub(crate) fn new_token() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Outcome of a successful account verification
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiedAccount {
    pub user: User,
    pub account: Account,
    pub watcher: Watcher,
}

/// Sign-up completion across users, accounts and watchers
#[derive(Clone, Debug)]
pub struct IdentityService {
    pub users: UserService,
    pub accounts: AccountService,
    watchers: WatcherService,
}

impl IdentityService {
    pub fn new(users: UserService, accounts: AccountService, watchers: WatcherService) -> Self {
        Self {
            users,
            accounts,
            watchers,
        }
    }

    /// Activates a new user and gives them an account and a watcher
    ///
    /// With a join token the user joins that existing account; otherwise a new account
    /// owned by the user is created. The activation code is consumed before any account
    /// is created, so a repeated submission fails without leaving an account behind.
    pub async fn verify_account(
        &self,
        activation_code: &str,
        join_token: Option<&str>,
    ) -> AppResult<VerifiedAccount> {
        let mut user = self.users.get_user_by_activation_code(activation_code).await?;

        let account = match join_token.map(str::trim).filter(|t| !t.is_empty()) {
            Some(token) => {
                let account = self.accounts.get_account_by_join_token(token).await?;
                self.users.activate_user(activation_code).await?;
                self.users.add_user_to_account(user.id, account.id).await?;
                account
            }
            None => {
                self.users.activate_user(activation_code).await?;
                self.accounts.create_account(user.id, Some(user.id)).await?
            }
        };

        user.active = true;
        user.activation_code = None;
        user.account_id = Some(account.id);

        let watcher = self.watchers.create_watcher_for_user(&user).await?;

        tracing::info!(
            user_id = user.id,
            account_id = account.id,
            joined_existing = join_token.is_some(),
            "Account verified"
        );

        Ok(VerifiedAccount {
            user,
            account,
            watcher,
        })
    }
}
