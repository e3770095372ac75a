//! Repository for request, user and password operations.
//!
//! Every operation is a read-modify-write of a whole data file.

use std::cmp::Reverse;

use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

use super::{JsonStore, PASSWORDS_FILE, REQUESTS_FILE, USERS_FILE};
use crate::auth::constant_time_compare;
use crate::errors::AppError;
use crate::models::{
    Comment, NewComment, NewServiceRequest, NewUser, PasswordStore, RequestFilter, RequestStats,
    RequestStatus, ServiceRequest, User, UserChanges,
};

/// Repository for all data operations.
#[derive(Debug, Clone)]
pub struct Repository {
    store: JsonStore,
}

impl Repository {
    pub fn new(store: JsonStore) -> Self {
        Self { store }
    }

    #[cfg(test)]
    pub fn store(&self) -> &JsonStore {
        &self.store
    }

    /// Create any missing data file with its empty contents.
    pub async fn init(&self) -> Result<(), AppError> {
        self.load_requests().await?;
        self.load_users().await?;
        self.load_passwords().await?;
        Ok(())
    }

    async fn load_requests(&self) -> Result<Vec<ServiceRequest>, AppError> {
        self.store.read(REQUESTS_FILE, Vec::new()).await
    }

    async fn save_requests(&self, requests: &[ServiceRequest]) -> Result<(), AppError> {
        self.store.write(REQUESTS_FILE, requests).await
    }

    async fn load_users(&self) -> Result<Vec<User>, AppError> {
        self.store.read(USERS_FILE, Vec::new()).await
    }

    async fn save_users(&self, users: &[User]) -> Result<(), AppError> {
        self.store.write(USERS_FILE, users).await
    }

    async fn load_passwords(&self) -> Result<PasswordStore, AppError> {
        self.store.read(PASSWORDS_FILE, PasswordStore::new()).await
    }

    async fn save_passwords(&self, passwords: &PasswordStore) -> Result<(), AppError> {
        self.store.write(PASSWORDS_FILE, passwords).await
    }

    // ==================== REQUEST OPERATIONS ====================

    /// List requests matching `filter`, most recently updated first.
    pub async fn list_requests(
        &self,
        filter: &RequestFilter,
    ) -> Result<Vec<ServiceRequest>, AppError> {
        let mut requests: Vec<ServiceRequest> = self
            .load_requests()
            .await?
            .into_iter()
            .filter(|r| filter.matches(r))
            .collect();

        requests.sort_by_cached_key(|r| Reverse(parse_timestamp(&r.updated_at)));
        Ok(requests)
    }

    pub async fn get_request(&self, id: &str) -> Result<Option<ServiceRequest>, AppError> {
        let requests = self.load_requests().await?;
        Ok(requests.into_iter().find(|r| r.id == id))
    }

    pub async fn create_request(
        &self,
        new: NewServiceRequest,
    ) -> Result<ServiceRequest, AppError> {
        let mut requests = self.load_requests().await?;
        let now = now();

        let request = ServiceRequest {
            id: uuid::Uuid::new_v4().to_string(),
            title: new.title,
            description: new.description,
            request_type: new.request_type,
            status: RequestStatus::Pending,
            client_id: new.client_id,
            client_name: new.client_name,
            created_at: now.clone(),
            updated_at: now,
            comments: Vec::new(),
        };

        requests.push(request.clone());
        self.save_requests(&requests).await?;

        tracing::info!(
            request_id = %request.id,
            client_id = %request.client_id,
            request_type = request.request_type.as_str(),
            "Created request"
        );
        Ok(request)
    }

    /// Overwrite the status of a request. No transition is rejected.
    pub async fn update_request_status(
        &self,
        id: &str,
        status: RequestStatus,
    ) -> Result<ServiceRequest, AppError> {
        let mut requests = self.load_requests().await?;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| request_not_found(id))?;

        let previous = request.status;
        request.status = status;
        request.updated_at = now();
        let updated = request.clone();

        self.save_requests(&requests).await?;

        tracing::info!(
            request_id = %id,
            from = previous.as_str(),
            to = status.as_str(),
            "Updated request status"
        );
        Ok(updated)
    }

    /// Append a comment and bump the parent's `updated_at`.
    pub async fn add_comment(&self, id: &str, new: NewComment) -> Result<Comment, AppError> {
        let mut requests = self.load_requests().await?;
        let request = requests
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| request_not_found(id))?;

        let now = now();
        let comment = Comment {
            id: uuid::Uuid::new_v4().to_string(),
            content: new.content,
            user_id: new.user_id,
            user_name: new.user_name,
            user_role: new.user_role,
            created_at: now.clone(),
        };

        request.comments.push(comment.clone());
        request.updated_at = now;

        self.save_requests(&requests).await?;

        tracing::info!(request_id = %id, comment_id = %comment.id, "Added comment");
        Ok(comment)
    }

    pub async fn delete_request(&self, id: &str) -> Result<(), AppError> {
        let mut requests = self.load_requests().await?;
        let before = requests.len();
        requests.retain(|r| r.id != id);

        if requests.len() == before {
            return Err(request_not_found(id));
        }

        self.save_requests(&requests).await?;
        tracing::info!(request_id = %id, "Deleted request");
        Ok(())
    }

    /// Remove every request submitted by `client_id`, returning how many went.
    pub async fn delete_requests_for_client(&self, client_id: &str) -> Result<usize, AppError> {
        let mut requests = self.load_requests().await?;
        let before = requests.len();
        requests.retain(|r| r.client_id != client_id);
        let deleted = before - requests.len();

        if deleted > 0 {
            self.save_requests(&requests).await?;
        }

        tracing::info!(client_id = %client_id, deleted, "Deleted client requests");
        Ok(deleted)
    }

    pub async fn request_stats(&self, client_id: Option<&str>) -> Result<RequestStats, AppError> {
        let requests = self.load_requests().await?;
        Ok(RequestStats::tally(
            requests
                .iter()
                .filter(|r| client_id.map_or(true, |c| r.client_id == c)),
        ))
    }

    // ==================== USER OPERATIONS ====================

    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        self.load_users().await
    }

    pub async fn get_user(&self, id: &str) -> Result<Option<User>, AppError> {
        let users = self.load_users().await?;
        Ok(users.into_iter().find(|u| u.id == id))
    }

    /// Create a user, then store its initial password in a second write.
    ///
    /// The two writes are independent: if the second fails the user exists
    /// without a password entry.
    pub async fn create_user(&self, new: NewUser) -> Result<User, AppError> {
        let mut users = self.load_users().await?;

        if users.iter().any(|u| u.has_email(&new.email)) {
            return Err(AppError::Validation("Email already registered".to_string()));
        }

        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            name: new.name,
            email: new.email,
            role: new.role,
        };

        users.push(user.clone());
        self.save_users(&users).await?;
        tracing::info!(user_id = %user.id, role = user.role.as_str(), "Created user");

        if let Some(password) = new.password.filter(|p| !p.trim().is_empty()) {
            self.set_password(&user.id, &password).await?;
            tracing::info!(user_id = %user.id, "Stored initial password");
        }

        Ok(user)
    }

    pub async fn update_user(&self, id: &str, changes: UserChanges) -> Result<User, AppError> {
        let mut users = self.load_users().await?;

        let index = users
            .iter()
            .position(|u| u.id == id)
            .ok_or_else(|| user_not_found(id))?;

        if users
            .iter()
            .any(|u| u.id != id && u.has_email(&changes.email))
        {
            return Err(AppError::Validation("Email already registered".to_string()));
        }

        let user = &mut users[index];
        user.name = changes.name;
        user.email = changes.email;
        if let Some(role) = changes.role {
            user.role = role;
        }
        let updated = user.clone();

        self.save_users(&users).await?;
        tracing::info!(user_id = %id, "Updated user");
        Ok(updated)
    }

    /// Remove a user and its password entry. Requests are left in place.
    pub async fn delete_user(&self, id: &str) -> Result<(), AppError> {
        let mut users = self.load_users().await?;
        let before = users.len();
        users.retain(|u| u.id != id);

        if users.len() == before {
            return Err(user_not_found(id));
        }

        self.save_users(&users).await?;

        let mut passwords = self.load_passwords().await?;
        if passwords.remove(id).is_some() {
            self.save_passwords(&passwords).await?;
        }

        tracing::info!(user_id = %id, "Deleted user");
        Ok(())
    }

    // ==================== PASSWORD OPERATIONS ====================

    pub async fn get_passwords(&self) -> Result<PasswordStore, AppError> {
        self.load_passwords().await
    }

    /// Overwrite the whole password store.
    pub async fn replace_passwords(&self, passwords: &PasswordStore) -> Result<(), AppError> {
        self.save_passwords(passwords).await?;
        tracing::info!(entries = passwords.len(), "Replaced password store");
        Ok(())
    }

    /// Set a new password after checking the current one.
    ///
    /// A user with no stored password can never pass the check.
    pub async fn change_password(
        &self,
        user_id: &str,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut passwords = self.load_passwords().await?;

        let matches = passwords
            .get(user_id)
            .is_some_and(|stored| constant_time_compare(stored, current_password));

        if !matches {
            tracing::warn!(user_id = %user_id, "Rejected password change: current password mismatch");
            return Err(AppError::Validation(
                "Current password is incorrect".to_string(),
            ));
        }

        passwords.insert(user_id.to_string(), new_password.to_string());
        self.save_passwords(&passwords).await?;

        tracing::info!(user_id = %user_id, "Changed password");
        Ok(())
    }

    /// Set a password without checking the current one.
    pub async fn force_password(&self, user_id: &str, new_password: &str) -> Result<(), AppError> {
        self.set_password(user_id, new_password).await?;

        tracing::info!(user_id = %user_id, "Password set without current-password check");
        Ok(())
    }

    async fn set_password(&self, user_id: &str, password: &str) -> Result<(), AppError> {
        let mut passwords = self.load_passwords().await?;
        passwords.insert(user_id.to_string(), password.to_string());
        self.save_passwords(&passwords).await
    }

    /// Look up a user by email and compare the plaintext password.
    pub async fn verify_login(&self, email: &str, password: &str) -> Result<User, AppError> {
        let users = self.load_users().await?;
        let passwords = self.load_passwords().await?;

        let user = users.into_iter().find(|u| u.has_email(email));
        let verified = user.filter(|u| {
            passwords
                .get(&u.id)
                .is_some_and(|stored| constant_time_compare(stored, password))
        });

        match verified {
            Some(user) => {
                tracing::info!(user_id = %user.id, "Login succeeded");
                Ok(user)
            }
            None => {
                tracing::warn!("Login failed");
                Err(AppError::Unauthorized(
                    "Invalid email or password".to_string(),
                ))
            }
        }
    }
}

fn now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(value: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(value).ok()
}

fn request_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("Request {} not found", id))
}

fn user_not_found(id: &str) -> AppError {
    AppError::NotFound(format!("User {} not found", id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RequestType, UserRole};
    use tempfile::TempDir;

    fn repo() -> (Repository, TempDir) {
        let dir = TempDir::new().unwrap();
        (Repository::new(JsonStore::new(dir.path())), dir)
    }

    fn new_request(client_id: &str, title: &str) -> NewServiceRequest {
        NewServiceRequest {
            title: title.to_string(),
            description: "Needs a caption".to_string(),
            request_type: RequestType::Post,
            client_id: client_id.to_string(),
            client_name: "Padaria Sol".to_string(),
        }
    }

    fn new_user(email: &str, password: Option<&str>) -> NewUser {
        NewUser {
            name: "Ana".to_string(),
            email: email.to_string(),
            role: UserRole::Client,
            password: password.map(str::to_string),
        }
    }

    async fn seed_passwords(repo: &Repository, entries: &[(&str, &str)]) {
        let passwords: PasswordStore = entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        repo.replace_passwords(&passwords).await.unwrap();
    }

    #[tokio::test]
    async fn test_init_creates_all_files() {
        let (repo, _dir) = repo();
        repo.init().await.unwrap();

        for file in [REQUESTS_FILE, USERS_FILE, PASSWORDS_FILE] {
            assert!(repo.store().path_for(file).exists(), "{} missing", file);
        }
    }

    #[tokio::test]
    async fn test_create_request_defaults() {
        let (repo, _dir) = repo();

        let request = repo.create_request(new_request("c1", "Launch")).await.unwrap();

        assert!(!request.id.is_empty());
        assert_eq!(request.status, RequestStatus::Pending);
        assert_eq!(request.created_at, request.updated_at);
        assert!(request.comments.is_empty());
        assert_eq!(repo.get_request(&request.id).await.unwrap(), Some(request));
    }

    #[tokio::test]
    async fn test_status_accepts_any_transition() {
        let (repo, _dir) = repo();
        let request = repo.create_request(new_request("c1", "Launch")).await.unwrap();

        let completed = repo
            .update_request_status(&request.id, RequestStatus::Completed)
            .await
            .unwrap();
        assert_eq!(completed.status, RequestStatus::Completed);

        let reopened = repo
            .update_request_status(&request.id, RequestStatus::Pending)
            .await
            .unwrap();
        assert_eq!(reopened.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn test_update_status_unknown_id_leaves_file_unchanged() {
        let (repo, _dir) = repo();
        repo.create_request(new_request("c1", "Launch")).await.unwrap();
        let path = repo.store().path_for(REQUESTS_FILE);
        let before = std::fs::read_to_string(&path).unwrap();

        let result = repo
            .update_request_status("missing", RequestStatus::Rejected)
            .await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    }

    #[tokio::test]
    async fn test_add_comment_appends_one() {
        let (repo, _dir) = repo();
        let request = repo.create_request(new_request("c1", "Launch")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        let comment = repo
            .add_comment(
                &request.id,
                NewComment {
                    content: "Can we use the blue palette?".to_string(),
                    user_id: "c1".to_string(),
                    user_name: "Padaria Sol".to_string(),
                    user_role: UserRole::Client,
                },
            )
            .await
            .unwrap();

        let stored = repo.get_request(&request.id).await.unwrap().unwrap();
        assert_eq!(stored.comments.len(), 1);
        assert_eq!(stored.comments[0], comment);
        assert_eq!(stored.updated_at, comment.created_at);
        assert_ne!(stored.updated_at, request.updated_at);
    }

    #[tokio::test]
    async fn test_list_orders_by_updated_at() {
        let (repo, _dir) = repo();
        let first = repo.create_request(new_request("c1", "First")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let second = repo.create_request(new_request("c1", "Second")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        repo.update_request_status(&first.id, RequestStatus::InProgress)
            .await
            .unwrap();

        let listed = repo.list_requests(&RequestFilter::default()).await.unwrap();
        let ids: Vec<&str> = listed.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec![first.id.as_str(), second.id.as_str()]);
    }

    #[tokio::test]
    async fn test_delete_requests_for_client() {
        let (repo, _dir) = repo();
        repo.create_request(new_request("c1", "One")).await.unwrap();
        repo.create_request(new_request("c1", "Two")).await.unwrap();
        let kept = repo.create_request(new_request("c2", "Three")).await.unwrap();

        assert_eq!(repo.delete_requests_for_client("c1").await.unwrap(), 2);
        assert_eq!(repo.delete_requests_for_client("c1").await.unwrap(), 0);

        let remaining = repo.list_requests(&RequestFilter::default()).await.unwrap();
        assert_eq!(remaining, vec![kept]);
    }

    #[tokio::test]
    async fn test_request_stats_for_client() {
        let (repo, _dir) = repo();
        let one = repo.create_request(new_request("c1", "One")).await.unwrap();
        repo.create_request(new_request("c1", "Two")).await.unwrap();
        repo.create_request(new_request("c2", "Three")).await.unwrap();
        repo.update_request_status(&one.id, RequestStatus::Completed)
            .await
            .unwrap();

        let all = repo.request_stats(None).await.unwrap();
        assert_eq!(all.total, 3);

        let c1 = repo.request_stats(Some("c1")).await.unwrap();
        assert_eq!(c1.total, 2);
        assert_eq!(c1.by_status.completed, 1);
        assert_eq!(c1.by_status.pending, 1);
        assert_eq!(c1.by_type.post, 2);
    }

    #[tokio::test]
    async fn test_change_password_example() {
        let (repo, _dir) = repo();
        seed_passwords(&repo, &[("u1", "old")]).await;

        repo.change_password("u1", "old", "new").await.unwrap();
        assert_eq!(
            repo.get_passwords().await.unwrap().get("u1").map(String::as_str),
            Some("new")
        );

        let rejected = repo.change_password("u1", "wrong", "new2").await;
        assert!(matches!(rejected, Err(AppError::Validation(_))));

        let passwords = repo.get_passwords().await.unwrap();
        assert_eq!(passwords.len(), 1);
        assert_eq!(passwords.get("u1").map(String::as_str), Some("new"));
    }

    #[tokio::test]
    async fn test_change_password_without_entry_is_rejected() {
        let (repo, _dir) = repo();

        let result = repo.change_password("ghost", "", "new").await;

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert!(repo.get_passwords().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_force_password_ignores_current() {
        let (repo, _dir) = repo();
        seed_passwords(&repo, &[("u1", "old")]).await;

        repo.force_password("u1", "reset").await.unwrap();
        repo.force_password("u2", "fresh").await.unwrap();

        let passwords = repo.get_passwords().await.unwrap();
        assert_eq!(passwords.get("u1").map(String::as_str), Some("reset"));
        assert_eq!(passwords.get("u2").map(String::as_str), Some("fresh"));
    }

    #[tokio::test]
    async fn test_create_user_stores_initial_password() {
        let (repo, _dir) = repo();

        let user = repo
            .create_user(new_user("ana@agency.test", Some("secret")))
            .await
            .unwrap();

        let passwords = repo.get_passwords().await.unwrap();
        assert_eq!(passwords.get(&user.id).map(String::as_str), Some("secret"));
    }

    #[tokio::test]
    async fn test_create_user_skips_blank_password() {
        let (repo, _dir) = repo();

        let blank = repo
            .create_user(new_user("ana@agency.test", Some("   ")))
            .await
            .unwrap();
        let empty = repo
            .create_user(new_user("bia@agency.test", Some("")))
            .await
            .unwrap();

        let passwords = repo.get_passwords().await.unwrap();
        assert!(!passwords.contains_key(&blank.id));
        assert!(!passwords.contains_key(&empty.id));
        assert!(matches!(
            repo.verify_login("ana@agency.test", "   ").await,
            Err(AppError::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_email() {
        let (repo, _dir) = repo();
        repo.create_user(new_user("ana@agency.test", Some("pw")))
            .await
            .unwrap();

        let duplicate = repo.create_user(new_user("ANA@agency.test", None)).await;

        assert!(matches!(duplicate, Err(AppError::Validation(_))));
        assert_eq!(repo.list_users().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_user_email_uniqueness_excludes_self() {
        let (repo, _dir) = repo();
        let ana = repo.create_user(new_user("ana@agency.test", None)).await.unwrap();
        repo.create_user(new_user("bia@agency.test", None)).await.unwrap();

        let renamed = repo
            .update_user(
                &ana.id,
                UserChanges {
                    name: "Ana Souza".to_string(),
                    email: "ANA@agency.test".to_string(),
                    role: Some(UserRole::Admin),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Ana Souza");
        assert_eq!(renamed.role, UserRole::Admin);

        let clash = repo
            .update_user(
                &ana.id,
                UserChanges {
                    name: "Ana".to_string(),
                    email: "bia@agency.test".to_string(),
                    role: None,
                },
            )
            .await;
        assert!(matches!(clash, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_user_removes_password_and_blocks_login() {
        let (repo, _dir) = repo();
        let user = repo
            .create_user(new_user("ana@agency.test", Some("secret")))
            .await
            .unwrap();
        repo.create_request(new_request(&user.id, "Mine")).await.unwrap();

        assert_eq!(
            repo.verify_login("ana@agency.test", "secret").await.unwrap(),
            user
        );

        repo.delete_user(&user.id).await.unwrap();

        assert!(!repo.get_passwords().await.unwrap().contains_key(&user.id));
        assert!(matches!(
            repo.verify_login("ana@agency.test", "secret").await,
            Err(AppError::Unauthorized(_))
        ));
        // Requests are not cascaded.
        let filter = RequestFilter {
            client_id: Some(user.id.clone()),
            ..Default::default()
        };
        assert_eq!(repo.list_requests(&filter).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_verify_login_wrong_password() {
        let (repo, _dir) = repo();
        repo.create_user(new_user("ana@agency.test", Some("secret")))
            .await
            .unwrap();

        assert!(repo.verify_login("Ana@Agency.test", "secret").await.is_ok());
        assert!(matches!(
            repo.verify_login("ana@agency.test", "Secret").await,
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            repo.verify_login("nobody@agency.test", "secret").await,
            Err(AppError::Unauthorized(_))
        ));
    }
}
