diesel::table! {
    users (id) {
        id -> Int4,
        name -> Text,
        email -> Text,
        password_hash -> Text,
        role -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    equipment (id) {
        id -> Int4,
        name -> Text,
        description -> Text,
        serial_number -> Text,
        status -> Text,
        category -> Text,
        location -> Text,
        last_maintained -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    tasks (id) {
        id -> Int4,
        title -> Text,
        description -> Text,
        status -> Text,
        priority -> Text,
        team -> Text,
        assigned_date -> Timestamptz,
        completion_date -> Nullable<Timestamptz>,
        equipment_id -> Int4,
        user_id -> Nullable<Int4>,
        version -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    maintenance_events (id) {
        id -> Int4,
        title -> Text,
        description -> Nullable<Text>,
        event_date -> Timestamptz,
        event_type -> Text,
        equipment_id -> Nullable<Int4>,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(tasks -> equipment (equipment_id));
diesel::joinable!(tasks -> users (user_id));
diesel::joinable!(maintenance_events -> equipment (equipment_id));

diesel::allow_tables_to_appear_in_same_query!(users, equipment, tasks, maintenance_events);
