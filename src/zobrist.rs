use crate::{Color, Piece, SQUARE_COUNT};
use core::fmt;
use lazy_static::lazy_static;
use rand::Rng;
use std::{
    collections::{hash_map::DefaultHasher, HashSet},
    hash::{Hash, Hasher},
    ops::BitXorAssign,
};

/// one key per piece kind (white man/king, black man/king) and field
const PIECE_KINDS: usize = 4;

lazy_static! {
    pub static ref ZOBRIST_HASHER: ZobristHasher<u64> = {
        #[cfg(test)]
        let mut rng = {
            use rand::rngs::StdRng;
            use rand::SeedableRng;
            StdRng::seed_from_u64(123456789)
        };
        #[cfg(not(test))]
        let mut rng = rand::thread_rng();

        ZobristHasher::new_random(&mut rng)
    };
}

#[derive(Clone, Hash, PartialEq, Eq)]
pub struct ZobristHasher<H> {
    pub black_move: H,
    pub piece_hash: [H; SQUARE_COUNT * PIECE_KINDS],
}

impl<H: Hash> fmt::Debug for ZobristHasher<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        let hash = hasher.finish();
        f.debug_struct("ZobristHasher")
            .field("hash", &hash)
            .finish_non_exhaustive()
    }
}

impl<H: Clone> ZobristHasher<H> {
    pub fn piece_hash(&self, pos: impl Into<usize>, piece: Piece) -> H {
        self.piece_hash[pos.into() * PIECE_KINDS + piece.zobrist_index()].clone()
    }
}

impl ZobristHasher<u64> {
    pub fn new_random(rng: &mut impl Rng) -> Self {
        let mut used_hashes = HashSet::new();
        let mut rng = || loop {
            let result: u64 = rng.gen();
            if used_hashes.insert(result) {
                break result;
            }
        };
        let piece_hash = std::array::from_fn(|_| rng());

        Self {
            black_move: rng(),
            piece_hash,
        }
    }
}

impl<H: BitXorAssign + Clone + Default> ZobristHasher<H> {
    pub fn hash(&self, fields: &[Option<Piece>; SQUARE_COUNT], next_move: Color) -> H {
        let mut hash = H::default();
        if next_move == Color::Black {
            hash ^= self.black_move.clone();
        }

        for (i, piece) in fields.iter().enumerate() {
            if let Some(piece) = *piece {
                hash ^= self.piece_hash(i, piece);
            }
        }

        hash
    }
}
