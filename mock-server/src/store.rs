//! In-memory catalog state shared by the handlers.
//!
//! All rules that decide what a user may see live here so they can be tested
//! without HTTP: the `admin` account sees every book, notification and user;
//! everyone else sees only what they own.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const ADMIN_USERNAME: &str = "admin";

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_admin(&self) -> bool {
        self.username == ADMIN_USERNAME
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Book {
    pub id: u64,
    pub title: String,
    pub author: String,
    pub description: String,
    pub published_date: NaiveDate,
    pub isbn: Option<String>,
    pub is_read: bool,
    pub view_count: u64,
    pub added_by: u64,
    pub added_by_username: String,
    pub is_read_display: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub author: String,
    #[serde(default)]
    pub description: String,
    pub published_date: NaiveDate,
    #[serde(default)]
    pub isbn: Option<String>,
    #[serde(default)]
    pub is_read: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: u64,
    pub user: u64,
    pub user_username: String,
    pub title: String,
    pub message: String,
    pub notification_type: String,
    pub notification_type_display: String,
    pub book_recommendation: Option<u64>,
    pub book_title: Option<String>,
    pub book_author: Option<String>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct BookStatistics {
    pub total_books: u64,
    pub read_books: u64,
    pub unread_books: u64,
    pub read_percentage: f64,
    pub unread_percentage: f64,
    pub most_read_books: Vec<Book>,
    pub most_viewed_books: Vec<Book>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserStatistics {
    pub total_users: u64,
    pub admin_users: u64,
    pub regular_users: u64,
    pub users: Vec<User>,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct SystemStatistics {
    pub book_stats: BookStatistics,
    pub user_stats: UserStatistics,
    pub total_notifications: u64,
    pub read_notifications: u64,
    pub unread_notifications: u64,
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
pub struct Catalog {
    next_id: u64,
    accounts: BTreeMap<u64, Account>,
    sessions: HashMap<Uuid, u64>,
    books: BTreeMap<u64, Book>,
    notifications: BTreeMap<u64, Notification>,
}

impl Catalog {
    /// A catalog holding only the `admin`/`admin` account.
    pub fn seeded() -> Self {
        let mut catalog = Self::default();
        catalog.create_user(ADMIN_USERNAME, "admin@example.com", "admin");
        catalog
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    // --- accounts and sessions ---

    /// Returns `None` if the username or email is already taken.
    pub fn create_user(&mut self, username: &str, email: &str, password: &str) -> Option<User> {
        let taken = self
            .accounts
            .values()
            .any(|a| a.user.username == username || a.user.email == email);
        if taken {
            return None;
        }
        let user = User {
            id: self.allocate_id(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: Utc::now(),
        };
        self.accounts.insert(
            user.id,
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        Some(user)
    }

    pub fn authenticate(&self, username: &str, password: &str) -> Option<User> {
        self.accounts
            .values()
            .find(|a| a.user.username == username && a.password == password)
            .map(|a| a.user.clone())
    }

    pub fn check_password(&self, user_id: u64, password: &str) -> bool {
        self.accounts
            .get(&user_id)
            .is_some_and(|a| a.password == password)
    }

    pub fn set_password(&mut self, user_id: u64, password: &str) {
        if let Some(account) = self.accounts.get_mut(&user_id) {
            account.password = password.to_string();
        }
    }

    pub fn open_session(&mut self, user_id: u64) -> Uuid {
        let token = Uuid::new_v4();
        self.sessions.insert(token, user_id);
        token
    }

    pub fn close_session(&mut self, token: Uuid) {
        self.sessions.remove(&token);
    }

    pub fn session_user(&self, token: Uuid) -> Option<User> {
        let user_id = self.sessions.get(&token)?;
        self.accounts.get(user_id).map(|a| a.user.clone())
    }

    /// Every user, newest first. Empty for non-admins.
    pub fn users_visible_to(&self, viewer: &User) -> Vec<User> {
        if !viewer.is_admin() {
            return Vec::new();
        }
        self.accounts.values().rev().map(|a| a.user.clone()).collect()
    }

    pub fn user_statistics(&self) -> UserStatistics {
        let total_users = self.accounts.len() as u64;
        let admin_users = self
            .accounts
            .values()
            .filter(|a| a.user.is_admin())
            .count() as u64;
        UserStatistics {
            total_users,
            admin_users,
            regular_users: total_users - admin_users,
            users: self.accounts.values().rev().map(|a| a.user.clone()).collect(),
        }
    }

    // --- books ---

    /// Books `viewer` may see, newest first.
    pub fn books_visible_to(&self, viewer: &User) -> Vec<Book> {
        self.books
            .values()
            .rev()
            .filter(|b| viewer.is_admin() || b.added_by == viewer.id)
            .cloned()
            .collect()
    }

    pub fn book(&self, viewer: &User, id: u64) -> Option<Book> {
        self.books
            .get(&id)
            .filter(|b| viewer.is_admin() || b.added_by == viewer.id)
            .cloned()
    }

    /// Adds the book and a `book_added` notification for its owner.
    pub fn create_book(&mut self, owner: &User, input: BookInput) -> Book {
        let book = Book {
            id: self.allocate_id(),
            title: input.title,
            author: input.author,
            description: input.description,
            published_date: input.published_date,
            isbn: input.isbn,
            is_read: input.is_read,
            view_count: 0,
            added_by: owner.id,
            added_by_username: owner.username.clone(),
            is_read_display: read_display(input.is_read),
            created_at: Utc::now(),
        };
        self.books.insert(book.id, book.clone());

        let notification = Notification {
            id: self.allocate_id(),
            user: owner.id,
            user_username: owner.username.clone(),
            title: "Book added".to_string(),
            message: format!("\"{}\" was added to your catalog.", book.title),
            notification_type: "book_added".to_string(),
            notification_type_display: "Book Added".to_string(),
            book_recommendation: Some(book.id),
            book_title: Some(book.title.clone()),
            book_author: Some(book.author.clone()),
            is_read: false,
            created_at: Utc::now(),
        };
        self.notifications.insert(notification.id, notification);

        book
    }

    pub fn update_book(&mut self, viewer: &User, id: u64, input: BookInput) -> Option<Book> {
        let book = self.visible_book_mut(viewer, id)?;
        book.title = input.title;
        book.author = input.author;
        book.description = input.description;
        book.published_date = input.published_date;
        book.isbn = input.isbn;
        book.is_read = input.is_read;
        book.is_read_display = read_display(input.is_read);
        Some(book.clone())
    }

    pub fn delete_book(&mut self, viewer: &User, id: u64) -> bool {
        if self.visible_book_mut(viewer, id).is_none() {
            return false;
        }
        self.books.remove(&id).is_some()
    }

    pub fn toggle_read(&mut self, viewer: &User, id: u64) -> Option<Book> {
        let book = self.visible_book_mut(viewer, id)?;
        book.is_read = !book.is_read;
        book.is_read_display = read_display(book.is_read);
        Some(book.clone())
    }

    fn visible_book_mut(&mut self, viewer: &User, id: u64) -> Option<&mut Book> {
        self.books
            .get_mut(&id)
            .filter(|b| viewer.is_admin() || b.added_by == viewer.id)
    }

    // --- notifications ---

    pub fn notifications_visible_to(&self, viewer: &User) -> Vec<Notification> {
        self.notifications
            .values()
            .rev()
            .filter(|n| viewer.is_admin() || n.user == viewer.id)
            .cloned()
            .collect()
    }

    pub fn notification(&self, viewer: &User, id: u64) -> Option<Notification> {
        self.notifications
            .get(&id)
            .filter(|n| viewer.is_admin() || n.user == viewer.id)
            .cloned()
    }

    pub fn mark_notification_read(&mut self, viewer: &User, id: u64) -> Option<Notification> {
        let notification = self
            .notifications
            .get_mut(&id)
            .filter(|n| viewer.is_admin() || n.user == viewer.id)?;
        notification.is_read = true;
        Some(notification.clone())
    }

    pub fn delete_notification(&mut self, viewer: &User, id: u64) -> bool {
        if self.notification(viewer, id).is_none() {
            return false;
        }
        self.notifications.remove(&id).is_some()
    }

    /// Marks `owner`'s own unread notifications, even for admin. Returns how
    /// many changed.
    pub fn mark_all_read(&mut self, owner: &User) -> u64 {
        let mut count = 0;
        for notification in self.notifications.values_mut() {
            if notification.user == owner.id && !notification.is_read {
                notification.is_read = true;
                count += 1;
            }
        }
        count
    }

    pub fn unread_count(&self, owner: &User) -> u64 {
        self.notifications
            .values()
            .filter(|n| n.user == owner.id && !n.is_read)
            .count() as u64
    }

    // --- statistics ---

    pub fn system_statistics(&self) -> SystemStatistics {
        let all: Vec<Book> = self.books.values().rev().cloned().collect();
        let read_notifications = self.notifications.values().filter(|n| n.is_read).count() as u64;
        let total_notifications = self.notifications.len() as u64;
        SystemStatistics {
            book_stats: book_statistics(&all),
            user_stats: self.user_statistics(),
            total_notifications,
            read_notifications,
            unread_notifications: total_notifications - read_notifications,
        }
    }
}

/// Aggregate over `books`, which must already be ordered newest first.
pub fn book_statistics(books: &[Book]) -> BookStatistics {
    let total_books = books.len() as u64;
    let read_books = books.iter().filter(|b| b.is_read).count() as u64;
    let unread_books = total_books - read_books;

    let mut by_views: Vec<Book> = books.to_vec();
    by_views.sort_by(|a, b| b.view_count.cmp(&a.view_count));

    BookStatistics {
        total_books,
        read_books,
        unread_books,
        read_percentage: percentage(read_books, total_books),
        unread_percentage: percentage(unread_books, total_books),
        most_read_books: by_views.iter().filter(|b| b.is_read).take(5).cloned().collect(),
        most_viewed_books: by_views.into_iter().take(5).collect(),
    }
}

fn percentage(part: u64, total: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let raw = part as f64 / total as f64 * 100.0;
    (raw * 100.0).round() / 100.0
}

fn read_display(is_read: bool) -> String {
    let label = if is_read { "Read" } else { "Unread" };
    label.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, is_read: bool) -> BookInput {
        BookInput {
            title: title.to_string(),
            author: "Author".to_string(),
            description: String::new(),
            published_date: NaiveDate::from_ymd_opt(2001, 1, 1).unwrap(),
            isbn: None,
            is_read,
        }
    }

    fn with_reader() -> (Catalog, User, User) {
        let mut catalog = Catalog::seeded();
        let admin = catalog.authenticate("admin", "admin").unwrap();
        let reader = catalog
            .create_user("reader", "reader@example.com", "secret")
            .unwrap();
        (catalog, admin, reader)
    }

    #[test]
    fn seeded_catalog_has_admin() {
        let catalog = Catalog::seeded();
        let admin = catalog.authenticate("admin", "admin").unwrap();
        assert!(admin.is_admin());
        assert!(catalog.authenticate("admin", "wrong").is_none());
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let mut catalog = Catalog::seeded();
        assert!(catalog.create_user("admin", "other@example.com", "x").is_none());
    }

    #[test]
    fn readers_only_see_their_own_books() {
        let (mut catalog, admin, reader) = with_reader();
        catalog.create_book(&admin, input("Admin's", false));
        let mine = catalog.create_book(&reader, input("Reader's", false));

        let visible = catalog.books_visible_to(&reader);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].id, mine.id);
        assert_eq!(catalog.books_visible_to(&admin).len(), 2);
    }

    #[test]
    fn hidden_book_cannot_be_toggled_or_deleted() {
        let (mut catalog, admin, reader) = with_reader();
        let book = catalog.create_book(&admin, input("Admin's", false));
        assert!(catalog.toggle_read(&reader, book.id).is_none());
        assert!(!catalog.delete_book(&reader, book.id));
        assert!(catalog.toggle_read(&admin, book.id).unwrap().is_read);
    }

    #[test]
    fn creating_a_book_notifies_owner() {
        let (mut catalog, _admin, reader) = with_reader();
        let book = catalog.create_book(&reader, input("Dune", false));
        let notifications = catalog.notifications_visible_to(&reader);
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].book_recommendation, Some(book.id));
        assert_eq!(catalog.unread_count(&reader), 1);
        assert_eq!(catalog.mark_all_read(&reader), 1);
        assert_eq!(catalog.unread_count(&reader), 0);
    }

    #[test]
    fn statistics_round_percentages() {
        let (mut catalog, admin, _) = with_reader();
        catalog.create_book(&admin, input("a", true));
        catalog.create_book(&admin, input("b", false));
        catalog.create_book(&admin, input("c", false));

        let stats = book_statistics(&catalog.books_visible_to(&admin));
        assert_eq!(stats.total_books, 3);
        assert_eq!(stats.read_books, 1);
        assert_eq!(stats.read_percentage, 33.33);
        assert_eq!(stats.unread_percentage, 66.67);
        assert_eq!(stats.most_read_books.len(), 1);
    }

    #[test]
    fn statistics_of_empty_catalog_are_zero() {
        let stats = book_statistics(&[]);
        assert_eq!(stats.read_percentage, 0.0);
        assert!(stats.most_viewed_books.is_empty());
    }

    #[test]
    fn sessions_resolve_until_closed() {
        let (mut catalog, _, reader) = with_reader();
        let token = catalog.open_session(reader.id);
        assert_eq!(catalog.session_user(token).unwrap().username, "reader");
        catalog.close_session(token);
        assert!(catalog.session_user(token).is_none());
    }
}
