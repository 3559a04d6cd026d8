//! Database schema and migrations for the forum.
//!
//! Migrations are applied sequentially when the database is first opened or
//! upgraded. The schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: users
    r#"
CREATE TABLE users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    username    TEXT NOT NULL UNIQUE COLLATE NOCASE,
    email       TEXT NOT NULL DEFAULT '',
    password    TEXT NOT NULL,           -- Argon2 hash
    first_name  TEXT NOT NULL DEFAULT '',
    last_name   TEXT NOT NULL DEFAULT '',
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    last_login  TEXT
);

CREATE INDEX idx_users_email ON users(email COLLATE NOCASE);
"#,
    // v2: boards, topics, posts
    r#"
CREATE TABLE boards (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT ''
);

CREATE TABLE topics (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    subject      TEXT NOT NULL,
    board_id     INTEGER NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
    starter_id   INTEGER NOT NULL REFERENCES users(id),
    views        INTEGER NOT NULL DEFAULT 0,
    last_updated TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_topics_board_updated ON topics(board_id, last_updated);

CREATE TABLE posts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    message     TEXT NOT NULL,
    topic_id    INTEGER NOT NULL REFERENCES topics(id) ON DELETE CASCADE,
    created_by  INTEGER NOT NULL REFERENCES users(id),
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    updated_by  INTEGER REFERENCES users(id),
    updated_at  TEXT
);

CREATE INDEX idx_posts_topic_id ON posts(topic_id);
"#,
];
