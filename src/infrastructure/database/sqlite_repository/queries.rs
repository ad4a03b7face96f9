pub(super) const INSERT_USER: &str = r#"
    INSERT INTO users (email, name, created_at)
    VALUES (?1, ?2, ?3)
    RETURNING id, email, name, created_at
"#;

pub(super) const SELECT_USER_BY_ID: &str = r#"
    SELECT id, email, name, created_at
    FROM users
    WHERE id = ?1
"#;

pub(super) const INSERT_POST: &str = r#"
    INSERT INTO posts (user_id, author_name, title, content, category, views, created_at, updated_at)
    VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?6)
    RETURNING id, user_id, author_name, title, content, category, views, created_at, updated_at
"#;

pub(super) const SELECT_POST_BY_ID: &str = r#"
    SELECT id, user_id, author_name, title, content, category, views, created_at, updated_at
    FROM posts
    WHERE id = ?1
"#;

pub(super) const INCREMENT_POST_VIEWS: &str = r#"
    UPDATE posts
    SET views = views + 1
    WHERE id = ?1
    RETURNING views
"#;

pub(super) const DELETE_BOOKMARKS_BY_POST: &str = r#"
    DELETE FROM bookmarks
    WHERE post_id = ?1
"#;

pub(super) const DELETE_POST: &str = r#"
    DELETE FROM posts
    WHERE id = ?1
"#;

/// 次ページ判定のため `size + 1` 件を取得する
pub(super) const SELECT_POST_PAGE: &str = r#"
    SELECT p.id, p.user_id, p.author_name, p.title, p.content, p.category, p.views,
           p.created_at, p.updated_at,
           (SELECT COUNT(*) FROM bookmarks b WHERE b.post_id = p.id) AS bookmark_count
    FROM posts p
    ORDER BY p.created_at DESC, p.id DESC
    LIMIT ?1 OFFSET ?2
"#;

pub(super) const INSERT_BOOKMARK: &str = r#"
    INSERT INTO bookmarks (post_id, user_id, created_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(post_id, user_id) DO NOTHING
"#;

pub(super) const DELETE_BOOKMARK: &str = r#"
    DELETE FROM bookmarks
    WHERE post_id = ?1 AND user_id = ?2
"#;

pub(super) const SELECT_BOOKMARK_BY_POST_AND_USER: &str = r#"
    SELECT post_id, user_id, created_at
    FROM bookmarks
    WHERE post_id = ?1 AND user_id = ?2
"#;

pub(super) const COUNT_BOOKMARKS_BY_POST: &str = r#"
    SELECT COUNT(*)
    FROM bookmarks
    WHERE post_id = ?1
"#;

pub(super) const INCREMENT_ENGAGEMENT: &str = r#"
    INSERT INTO engagement_scores (bucket_id, post_id, score)
    VALUES (?1, ?2, 1)
    ON CONFLICT(bucket_id, post_id) DO UPDATE SET score = score + 1
    RETURNING score
"#;

pub(super) const SELECT_TOP_ENGAGEMENT: &str = r#"
    SELECT post_id, score
    FROM engagement_scores
    WHERE bucket_id = ?1
    ORDER BY score DESC, post_id ASC
    LIMIT ?2
"#;

pub(super) const DELETE_ENGAGEMENT_BUCKET: &str = r#"
    DELETE FROM engagement_scores
    WHERE bucket_id = ?1
"#;

pub(super) const SELECT_ENGAGEMENT_BUCKETS: &str = r#"
    SELECT DISTINCT bucket_id
    FROM engagement_scores
    ORDER BY bucket_id
"#;

pub(super) const UPSERT_SNAPSHOT: &str = r#"
    INSERT INTO ranking_snapshots (snapshot_key, payload, published_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(snapshot_key) DO UPDATE SET
        payload = excluded.payload,
        published_at = excluded.published_at
"#;

pub(super) const SELECT_SNAPSHOT: &str = r#"
    SELECT payload
    FROM ranking_snapshots
    WHERE snapshot_key = ?1
"#;
