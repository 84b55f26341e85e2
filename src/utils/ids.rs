//! Process-wide allocation of object handles
//!
//! Handles handed out to callers (displays, contexts, surfaces) are plain integers.
//! An integer is only reused after the object that owned it has been freed.

macro_rules! id_gen {
    ($mod_name:ident) => {
        pub(crate) mod $mod_name {
            use once_cell::sync::Lazy;
            use std::{collections::HashSet, sync::Mutex};

            static ID_DATA: Lazy<Mutex<(HashSet<usize>, usize)>> =
                Lazy::new(|| Mutex::new((HashSet::new(), 1)));

            pub(crate) fn next() -> usize {
                let (id_set, counter) = &mut *ID_DATA.lock().unwrap_or_else(|err| err.into_inner());

                if id_set.len() == usize::MAX - 1 {
                    panic!("Out of ids");
                }

                // 0 is reserved so that a zeroed handle never names a live object
                while *counter == 0 || !id_set.insert(*counter) {
                    *counter = counter.wrapping_add(1);
                }

                let new_id = *counter;
                *counter = counter.wrapping_add(1);

                new_id
            }

            pub(crate) fn remove(id: usize) -> bool {
                ID_DATA
                    .lock()
                    .unwrap_or_else(|err| err.into_inner())
                    .0
                    .remove(&id)
            }

            /// Owns an allocated id and gives it back once dropped
            #[derive(Debug, PartialEq, Eq, Hash)]
            pub(crate) struct Token(usize);

            impl Token {
                pub(crate) fn new() -> Token {
                    Token(next())
                }

                pub(crate) fn get(&self) -> usize {
                    self.0
                }
            }

            impl Drop for Token {
                fn drop(&mut self) {
                    remove(self.0);
                }
            }
        }
    };
}

pub(crate) use id_gen;

#[cfg(test)]
mod tests {
    id_gen!(test_ids);

    #[test]
    fn ids_are_unique_while_alive() {
        let a = test_ids::Token::new();
        let b = test_ids::Token::new();
        assert_ne!(a.get(), b.get());
        assert_ne!(a.get(), 0);
    }

    #[test]
    fn dropped_token_releases_its_id() {
        let token = test_ids::Token::new();
        let id = token.get();
        drop(token);
        assert!(!test_ids::remove(id));
    }
}
