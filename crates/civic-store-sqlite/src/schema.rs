//! SQL schema for the Civic SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS roles (
    role_id        TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    upvote_weight  INTEGER NOT NULL CHECK (upvote_weight >= 1),
    is_admin       INTEGER NOT NULL DEFAULT 0
);

-- role_id is not a foreign key: a dangling role makes votes fall back to
-- weight 1 instead of failing.
CREATE TABLE IF NOT EXISTS users (
    user_id     TEXT PRIMARY KEY,
    username    TEXT NOT NULL UNIQUE,
    role_id     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- Counter columns are caches; only the store's operations write them.
CREATE TABLE IF NOT EXISTS issue_groups (
    group_id       TEXT PRIMARY KEY,
    name           TEXT NOT NULL,
    owner_id       TEXT NOT NULL,
    upvote_count   INTEGER NOT NULL DEFAULT 0 CHECK (upvote_count >= 0),
    comment_count  INTEGER NOT NULL DEFAULT 0 CHECK (comment_count >= 0),
    issue_count    INTEGER NOT NULL DEFAULT 0 CHECK (issue_count >= 0),
    created_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS issues (
    issue_id       TEXT PRIMARY KEY,
    title          TEXT NOT NULL,
    description    TEXT NOT NULL DEFAULT '',
    owner_id       TEXT NOT NULL,
    group_id       TEXT REFERENCES issue_groups(group_id),
    upvote_count   INTEGER NOT NULL DEFAULT 0 CHECK (upvote_count >= 0),
    comment_count  INTEGER NOT NULL DEFAULT 0 CHECK (comment_count >= 0),
    posted_at      TEXT NOT NULL
);

-- One vote per (subject, voter). weight is frozen at cast time.
CREATE TABLE IF NOT EXISTS votes (
    subject_kind  TEXT NOT NULL,   -- 'issue' | 'group'
    subject_id    TEXT NOT NULL,
    voter_id      TEXT NOT NULL,
    weight        INTEGER NOT NULL CHECK (weight >= 1),
    cast_at       TEXT NOT NULL,
    PRIMARY KEY (subject_kind, subject_id, voter_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id    TEXT PRIMARY KEY,
    subject_kind  TEXT NOT NULL,
    subject_id    TEXT NOT NULL,
    author_id     TEXT NOT NULL,
    content       TEXT NOT NULL,
    posted_at     TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS group_join_requests (
    request_id          TEXT PRIMARY KEY,
    issue_id            TEXT NOT NULL REFERENCES issues(issue_id),
    group_id            TEXT NOT NULL REFERENCES issue_groups(group_id),
    initiated_by_group  INTEGER NOT NULL,
    status              TEXT NOT NULL
                        CHECK (status IN ('pending', 'approved', 'declined', 'cancelled')),
    requested_at        TEXT NOT NULL,
    handled_at          TEXT
);

CREATE TABLE IF NOT EXISTS role_change_requests (
    request_id         TEXT PRIMARY KEY,
    user_id            TEXT NOT NULL REFERENCES users(user_id),
    requested_role_id  TEXT NOT NULL REFERENCES roles(role_id),
    status             TEXT NOT NULL
                       CHECK (status IN ('pending', 'approved', 'rejected')),
    submitted_at       TEXT NOT NULL,
    reviewed_at        TEXT,
    reviewer_id        TEXT
);

-- At most one pending request per (issue, group) and per user.
CREATE UNIQUE INDEX IF NOT EXISTS join_requests_one_pending
    ON group_join_requests(issue_id, group_id) WHERE status = 'pending';
CREATE UNIQUE INDEX IF NOT EXISTS role_requests_one_pending
    ON role_change_requests(user_id) WHERE status = 'pending';

CREATE INDEX IF NOT EXISTS issues_group_idx    ON issues(group_id);
CREATE INDEX IF NOT EXISTS comments_subject_idx ON comments(subject_kind, subject_id);

PRAGMA user_version = 1;
";
