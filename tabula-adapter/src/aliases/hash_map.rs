pub type HashMap<K, V> = hashbrown::HashMap<K, V>;
