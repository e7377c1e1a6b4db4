use crate::{
    error::AppError,
    models::DemoAccount,
    rbac::Role,
    repository::{NewUser, Repository},
};

pub fn demo_email(role: Role) -> String {
    format!("demo.{}@atmosfera.local", role.as_str().to_ascii_lowercase())
}

fn demo_name(role: Role) -> &'static str {
    match role {
        Role::Admin => "Demo Administrator",
        Role::Club => "HC Demo Club",
        Role::Parent => "Demo Parent",
        Role::Player => "Demo Player",
        Role::Scout => "Demo Scout",
        Role::Agent => "Demo Agent",
    }
}

/// ensure_demo_accounts
///
/// Makes sure one account per role exists under the `demo.<role>@atmosfera.local`
/// addresses and returns them. Existing accounts are reused; one whose role was
/// changed since seeding gets its demo role back.
pub async fn ensure_demo_accounts(repo: &dyn Repository) -> Result<Vec<DemoAccount>, AppError> {
    let mut accounts = Vec::with_capacity(Role::ALL.len());
    for role in Role::ALL {
        let email = demo_email(role);
        let user = match repo.find_user_by_email(&email).await? {
            Some(user) if user.role == role => user,
            Some(user) => {
                tracing::info!(user_id = %user.id, from = %user.role, to = %role, "restoring demo account role");
                repo.set_user_role(user.id, role)
                    .await?
                    .ok_or(AppError::NotFound("demo account"))?
            }
            None => {
                repo.create_user(NewUser {
                    email: email.clone(),
                    role,
                    display_name: Some(demo_name(role).to_string()),
                })
                .await?
            }
        };
        accounts.push(DemoAccount {
            role: user.role,
            email: user.email,
            user_id: user.id,
            home: user.role.home().to_string(),
        });
    }
    Ok(accounts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MemoryRepository;

    #[tokio::test]
    async fn seeding_twice_reuses_the_accounts() {
        let repo = MemoryRepository::new();
        let first = ensure_demo_accounts(&repo).await.unwrap();
        let second = ensure_demo_accounts(&repo).await.unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(first, second);
        assert_eq!(first[0].email, "demo.admin@atmosfera.local");
        assert_eq!(first[0].home, "/admin");
    }

    #[tokio::test]
    async fn seeding_restores_a_changed_demo_role() {
        let repo = MemoryRepository::new();
        let accounts = ensure_demo_accounts(&repo).await.unwrap();
        let scout = accounts.iter().find(|a| a.role == Role::Scout).unwrap();
        repo.set_user_role(scout.user_id, Role::Admin).await.unwrap();

        let accounts = ensure_demo_accounts(&repo).await.unwrap();
        let restored = accounts.iter().find(|a| a.email == demo_email(Role::Scout)).unwrap();
        assert_eq!(restored.role, Role::Scout);
        assert_eq!(restored.user_id, scout.user_id);
        let stored = repo.get_user(scout.user_id).await.unwrap().unwrap();
        assert_eq!(stored.role, Role::Scout);
    }
}
