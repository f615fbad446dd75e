table! {
    game_tier (game_id, username, tierlist_name) {
        game_id -> Int4,
        username -> Varchar,
        tierlist_name -> Varchar,
        tier_id -> Int4,
    }
}

table! {
    tier (tier_id) {
        tier_id -> Int4,
        tier_rank -> Int4,
        name -> Varchar,
        color -> Varchar,
    }
}

table! {
    tierlist (username, tierlist_name) {
        username -> Varchar,
        tierlist_name -> Varchar,
        created -> Date,
    }
}

table! {
    user_info (username) {
        username -> Varchar,
        full_name -> Varchar,
        password_hash -> Text,
        is_admin -> Bool,
    }
}

table! {
    video_game (game_id) {
        game_id -> Int4,
        name -> Varchar,
        developer -> Varchar,
        publisher -> Varchar,
        release_date -> Date,
        sales -> Int8,
        platform -> Varchar,
    }
}

joinable!(game_tier -> tier (tier_id));
joinable!(game_tier -> video_game (game_id));
joinable!(tierlist -> user_info (username));

allow_tables_to_appear_in_same_query!(game_tier, tier, tierlist, user_info, video_game,);
