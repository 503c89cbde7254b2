// Diesel table definitions for the pagewarden database.

diesel::table! {
    seo_pages (id) {
        id -> Text,
        slug -> Text,
        page_type -> Text,
        title -> Text,
        meta_title -> Nullable<Text>,
        meta_description -> Nullable<Text>,
        h1 -> Nullable<Text>,
        content -> Nullable<Text>,
        word_count -> Integer,
        is_thin_content -> Bool,
        is_duplicate -> Bool,
        is_indexed -> Bool,
        similarity_score -> Nullable<Double>,
        duplicate_of -> Nullable<Text>,
        metadata_hash -> Nullable<Text>,
        content_hash -> Nullable<Text>,
        last_generated_at -> Nullable<Text>,
        generation_version -> Integer,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    metadata_history (id) {
        id -> Integer,
        slug -> Text,
        previous_title -> Nullable<Text>,
        previous_description -> Nullable<Text>,
        previous_h1 -> Nullable<Text>,
        new_title -> Nullable<Text>,
        new_description -> Nullable<Text>,
        new_h1 -> Nullable<Text>,
        change_reason -> Text,
        batch_id -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    audit_runs (id) {
        id -> Text,
        run_type -> Text,
        status -> Text,
        total_pages -> Integer,
        processed_pages -> Integer,
        fixed_pages -> Integer,
        skipped_pages -> Integer,
        error_count -> Integer,
        errors -> Text,
        summary -> Nullable<Text>,
        triggered_by -> Nullable<Text>,
        started_at -> Text,
        completed_at -> Nullable<Text>,
    }
}

diesel::table! {
    bot_settings (setting_key) {
        setting_key -> Text,
        setting_value -> Text,
        updated_at -> Text,
    }
}

diesel::allow_tables_to_appear_in_same_query!(seo_pages, metadata_history, audit_runs, bot_settings);
