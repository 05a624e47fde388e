//! Database schema initialization

use sqlx::SqlitePool;

use crate::error::Result;

/// Initialize the database schema
pub async fn initialize_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(SCHEMA_SQL).execute(pool).await?;

    Ok(())
}

const SCHEMA_SQL: &str = r#"
-- Accounts
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    date_joined TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_email ON users(email);

-- Issued bearer tokens, stored as SHA-256 digests
CREATE TABLE IF NOT EXISTS auth_tokens (
    token_hash TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    -- 'access' or 'refresh'
    kind TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    revoked INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_auth_tokens_user ON auth_tokens(user_id);

-- Uploaded PDFs
CREATE TABLE IF NOT EXISTS documents (
    id TEXT PRIMARY KEY,
    owner_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    filename TEXT NOT NULL,
    file_path TEXT NOT NULL,
    uploaded_at TEXT NOT NULL,
    total_pages INTEGER NOT NULL DEFAULT 0,
    -- Sorted JSON array of 1-indexed page numbers
    excluded_pages TEXT NOT NULL DEFAULT '[]',
    thumbnails_ready INTEGER NOT NULL DEFAULT 0,
    thumbnail_count INTEGER NOT NULL DEFAULT 0,
    -- 'uploaded', 'rendering', 'ready' or 'error'
    status TEXT NOT NULL DEFAULT 'uploaded',
    version INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_documents_owner ON documents(owner_id);
CREATE INDEX IF NOT EXISTS idx_documents_uploaded_at ON documents(uploaded_at);

-- Text derived from a document's active pages (at most one per document)
CREATE TABLE IF NOT EXISTS processed_documents (
    id TEXT PRIMARY KEY,
    document_id TEXT NOT NULL UNIQUE REFERENCES documents(id) ON DELETE CASCADE,
    extracted_text TEXT NOT NULL,
    source_excluded_pages TEXT NOT NULL DEFAULT '[]',
    edited_text TEXT,
    -- 'pending', 'processing', 'completed' or 'failed'
    audio_status TEXT NOT NULL DEFAULT 'pending',
    audio_file TEXT,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL
);
"#;
